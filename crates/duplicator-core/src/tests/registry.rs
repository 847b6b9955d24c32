use super::THREE_IMAGES;
use crate::registry::{BATCH_LIMIT, derive, replace_batch, replace_batch_with_limit, replace_one};
use crate::*;

fn hrefs(doc: &Document) -> Vec<String> {
    derive(doc).into_iter().map(|r| r.href).collect()
}

#[test]
fn derive_lists_images_in_document_order() {
    let doc = Document::load(THREE_IMAGES).unwrap();
    let images = derive(&doc);
    let ids: Vec<String> = images.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, ["image-0", "image-1", "image-2"]);
    assert_eq!(hrefs(&doc), ["a.png", "b.png", "c.png"]);
    assert_eq!(
        images.iter().map(|r| r.href_attr).collect::<Vec<_>>(),
        [HrefAttr::Plain, HrefAttr::XlinkLegacy, HrefAttr::Plain]
    );
    assert!(images.iter().all(|r| r.index == r.id.index()));
}

#[test]
fn derive_is_idempotent() {
    let doc = Document::load(THREE_IMAGES).unwrap();
    assert_eq!(derive(&doc), derive(&doc));
}

#[test]
fn replace_one_touches_only_the_target_attribute() {
    let mut doc = Document::load(THREE_IMAGES).unwrap();
    let before = doc.serialize();

    assert!(replace_one(&mut doc, ImageId::new(1), "new.png").unwrap());
    let expected = before.replacen(r#"xlink:href="b.png""#, r#"xlink:href="new.png""#, 1);
    assert_eq!(doc.serialize(), expected);
    assert_eq!(hrefs(&doc), ["a.png", "new.png", "c.png"]);
}

#[test]
fn stale_ids_are_a_silent_no_op() {
    let mut doc = Document::load(THREE_IMAGES).unwrap();
    let before = doc.serialize();
    assert!(!replace_one(&mut doc, ImageId::new(7), "new.png").unwrap());
    assert_eq!(doc.serialize(), before);
}

#[test]
fn batch_shorter_than_the_image_list_replaces_a_prefix() {
    let mut doc = Document::load(THREE_IMAGES).unwrap();
    assert_eq!(replace_batch(&mut doc, &["x.png", "y.png"]).unwrap(), 2);
    assert_eq!(hrefs(&doc), ["x.png", "y.png", "c.png"]);
}

#[test]
fn batch_longer_than_the_image_list_discards_the_rest() {
    let mut doc = Document::load(THREE_IMAGES).unwrap();
    let batch = ["w.png", "x.png", "y.png", "z.png"];
    assert_eq!(replace_batch(&mut doc, &batch).unwrap(), 3);
    assert_eq!(hrefs(&doc), ["w.png", "x.png", "y.png"]);
    assert_eq!(doc.image_count(), 3);
}

#[test]
fn empty_plain_href_falls_through_to_xlink() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><image href="" xlink:href="legacy.png"/></svg>"#;
    let mut doc = Document::load(svg).unwrap();
    let image = derive(&doc)[0].clone();
    assert_eq!(image.href, "legacy.png");
    assert_eq!(image.href_attr, HrefAttr::XlinkLegacy);

    assert!(replace_one(&mut doc, image.id, "new.png").unwrap());
    assert!(doc.markup().contains(r#"href="" xlink:href="new.png""#));
    assert_eq!(hrefs(&doc), ["new.png"]);
}

#[test]
fn xlink_href_under_another_prefix_is_resolved_and_kept() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:l="http://www.w3.org/1999/xlink"><image l:href="n.png"/></svg>"#;
    let mut doc = Document::load(svg).unwrap();
    assert_eq!(derive(&doc)[0].href_attr, HrefAttr::Namespaced);

    replace_one(&mut doc, ImageId::new(0), "m.png").unwrap();
    assert!(doc.markup().contains(r#"l:href="m.png""#));
    assert_eq!(derive(&doc)[0].href_attr, HrefAttr::Namespaced);
}

#[test]
fn images_without_a_source_gain_a_plain_href() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><image width="5"/><image href=""/></svg>"#;
    let mut doc = Document::load(svg).unwrap();
    assert!(derive(&doc).iter().all(|r| r.href_attr == HrefAttr::Missing && r.href.is_empty()));

    assert_eq!(replace_batch(&mut doc, &["p.png", "q.png"]).unwrap(), 2);
    let images = derive(&doc);
    assert!(images.iter().all(|r| r.href_attr == HrefAttr::Plain));
    assert_eq!(hrefs(&doc), ["p.png", "q.png"]);
    assert_eq!(doc.markup().matches("href=").count(), 2);
}

#[test]
fn replacement_sources_are_attribute_escaped() {
    let mut doc = Document::load(THREE_IMAGES).unwrap();
    replace_one(&mut doc, ImageId::new(0), "a.png?x=1&y=\"2\"").unwrap();
    assert!(doc.markup().contains(r#"href="a.png?x=1&amp;y=&quot;2&quot;""#));
    assert_eq!(hrefs(&doc)[0], "a.png?x=1&y=\"2\"");
}

#[test]
fn replacement_restores_fill_and_crop() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><image href="a.png"/></svg>"#;
    let mut doc = Document::load(svg).unwrap();
    replace_one(&mut doc, ImageId::new(0), "b.png").unwrap();
    assert_eq!(doc.markup().matches(FILL_AND_CROP).count(), 1);
}

#[test]
fn batch_is_capped_at_three_sources() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><image href="a"/><image href="b"/><image href="c"/><image href="d"/><image href="e"/></svg>"#;
    let mut doc = Document::load(svg).unwrap();
    let batch = ["1", "2", "3", "4", "5"];

    assert_eq!(replace_batch(&mut doc, &batch).unwrap(), BATCH_LIMIT);
    assert_eq!(hrefs(&doc), ["1", "2", "3", "d", "e"]);

    assert_eq!(replace_batch_with_limit(&mut doc, &batch, 5).unwrap(), 5);
    assert_eq!(hrefs(&doc), ["1", "2", "3", "4", "5"]);
}

#[test]
fn entity_defined_images_are_never_replaced() {
    let svg = r#"<!DOCTYPE svg [<!ENTITY pic "<image href='a.png'/>">]><svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">&pic;&pic;</svg>"#;
    let mut doc = Document::load(svg).unwrap();

    assert!(!replace_one(&mut doc, ImageId::new(0), "new.png").unwrap());
    assert_eq!(replace_batch(&mut doc, &["x.png", "y.png"]).unwrap(), 0);
    assert_eq!(doc.markup(), svg);
    assert_eq!(hrefs(&doc), ["a.png", "a.png"]);
}
