use anchor_locator::{
    capture, generate, Descriptor, ElementContext, ElementLocator, LocatorPolicy, LocatorStrategy,
    SignatureMatcher, SignatureTier,
};
use live_dom::{Document, NodeId, Point};
use noteanchor_core_types::AnnotationId;
use serde_json::{json, Value};

fn card(text: &str, y: f64) -> Value {
    json!({
        "tag": "div",
        "attrs": {"class": "card"},
        "rect": {"x": 20, "y": y, "width": 400, "height": 80},
        "text": text
    })
}

fn page(cards: Vec<Value>) -> Document {
    Document::from_value(json!({
        "viewport": {"width": 1440, "height": 900},
        "root": {"tag": "html", "children": [{"tag": "body", "children": cards}]}
    }))
    .expect("valid snapshot")
}

fn find_text(doc: &Document, tag: &str, text: &str) -> NodeId {
    doc.elements_by_tag(tag)
        .into_iter()
        .find(|node| doc.text_sample(*node, 100) == text)
        .expect("element with text")
}

fn bare_descriptor(selector: &str, tag: &str, text: &str, at: Point) -> Descriptor {
    Descriptor {
        id: AnnotationId::from("bare"),
        selector: selector.to_string(),
        element_context: ElementContext {
            tag: tag.to_string(),
            classes: Vec::new(),
            text: text.to_string(),
            position: at,
        },
        parent_chain: Vec::new(),
    }
}

#[test]
fn reordered_cards_resolve_to_the_same_text() {
    let before = page(vec![card("Alpha", 0.0), card("Beta", 100.0)]);
    let beta = find_text(&before, "div", "Beta");
    let descriptor = capture(&before, beta, AnnotationId::from("note-beta"), &LocatorPolicy::default())
        .expect("capture");

    // Reload with the cards swapped.
    let after = page(vec![card("Beta", 0.0), card("Alpha", 100.0)]);
    let mut locator = ElementLocator::default();
    let resolution = locator.locate(&after, &descriptor).expect("found");

    assert_eq!(after.text_sample(resolution.node, 100), "Beta");
    assert_eq!(resolution.strategy, LocatorStrategy::TextContent);
    let upgraded = resolution.upgraded_selector.expect("selector upgraded");
    assert_eq!(after.query_selector_all(&upgraded).unwrap(), vec![resolution.node]);
}

#[test]
fn persisted_descriptor_survives_json_round_trip_and_reload() {
    let before = page(vec![card("Alpha", 0.0), card("Beta", 100.0)]);
    let alpha = find_text(&before, "div", "Alpha");
    let json = capture(&before, alpha, AnnotationId::from("a"), &LocatorPolicy::default())
        .expect("capture")
        .to_json()
        .expect("serialize");

    let stored = Descriptor::from_json(&json).expect("decode");
    let after = page(vec![card("Alpha", 0.0), card("Beta", 100.0)]);
    let resolution = ElementLocator::default().locate(&after, &stored).expect("found");
    assert_eq!(after.text_sample(resolution.node, 100), "Alpha");
    assert_eq!(resolution.strategy, LocatorStrategy::Selector);
}

#[test]
fn identity_marks_do_not_survive_reload() {
    let doc = page(vec![card("Alpha", 0.0)]);
    let alpha = find_text(&doc, "div", "Alpha");
    let descriptor =
        capture(&doc, alpha, AnnotationId::from("a"), &LocatorPolicy::default()).expect("capture");
    let mut locator = ElementLocator::default();

    locator.locate(&doc, &descriptor).expect("first");
    let again = locator.locate(&doc, &descriptor).expect("second");
    assert_eq!(again.strategy, LocatorStrategy::IdentityMark);

    let reloaded = page(vec![card("Alpha", 0.0)]);
    let fresh = locator.locate(&reloaded, &descriptor).expect("after reload");
    assert_ne!(fresh.strategy, LocatorStrategy::IdentityMark);
}

#[test]
fn exact_text_beats_position() {
    let doc = page(vec![card("Near", 0.0), card("Far", 500.0)]);
    let far = find_text(&doc, "div", "Far");
    let descriptor = bare_descriptor("div.card", "div", "Far", Point::new(20.0, 0.0));
    let resolution = ElementLocator::default().locate(&doc, &descriptor).expect("found");
    assert_eq!(resolution.node, far);
    assert_eq!(resolution.strategy, LocatorStrategy::Selector);
}

#[test]
fn position_tolerance_is_inclusive() {
    let doc = page(vec![card("", 0.0), card("", 300.0)]);
    let locator_policy = LocatorPolicy::default();

    // Exactly 30 below the second card's corner at (20, 300).
    let inside = bare_descriptor("", "div", "", Point::new(20.0, 330.0));
    let hit = ElementLocator::new(locator_policy.clone())
        .locate(&doc, &inside)
        .expect("within tolerance");
    assert_eq!(hit.strategy, LocatorStrategy::Position);
    assert_eq!(doc.rect(hit.node).map(|r| r.y), Some(300.0));

    let outside = bare_descriptor("", "div", "", Point::new(20.0, 330.5));
    assert!(ElementLocator::new(locator_policy).locate(&doc, &outside).is_none());
}

#[test]
fn ambiguous_candidates_are_not_guessed() {
    let doc = page(vec![card("Same", 0.0), card("Same", 40.0)]);
    // Equidistant from both corners.
    let descriptor = bare_descriptor("div.card", "div", "Same", Point::new(20.0, 20.0));
    assert!(ElementLocator::default().locate(&doc, &descriptor).is_none());
}

#[test]
fn locate_is_deterministic() {
    let doc = page(vec![card("One", 0.0), card("Two", 100.0), card("Three", 200.0)]);
    let descriptor = bare_descriptor("div.card", "div", "", Point::new(20.0, 110.0));
    let first = ElementLocator::default().locate(&doc, &descriptor).expect("found");
    for _ in 0..5 {
        let again = ElementLocator::default().locate(&doc, &descriptor).expect("found");
        assert_eq!(again, first);
    }
}

#[test]
fn generated_selectors_match_exactly_one_element() {
    let doc = Document::from_value(json!({
        "root": {"tag": "html", "children": [{"tag": "body", "children": [
            {"tag": "header", "attrs": {"id": "top"}, "children": [
                {"tag": "a", "attrs": {"class": "nav-link active", "href": "/"}, "text": "Home"},
                {"tag": "a", "attrs": {"class": "nav-link", "href": "/about"}, "text": "About"}
            ]},
            {"tag": "main", "children": [
                {"tag": "p", "attrs": {"class": "css-1x2y3z"}, "text": "one"},
                {"tag": "p", "attrs": {"class": "css-9a8b7c"}, "text": "two"},
                {"tag": "p", "attrs": {"id": "ember2041"}, "text": "three"},
                {"tag": "ul", "children": [
                    {"tag": "li", "text": "a"}, {"tag": "li", "text": "b"}, {"tag": "li", "text": "c"}
                ]}
            ]}
        ]}]}
    }))
    .expect("valid snapshot");

    for node in doc.elements() {
        let selector = generate(&doc, node);
        assert_eq!(
            doc.query_selector_all(&selector).unwrap(),
            vec![node],
            "{selector}"
        );
    }
}

#[test]
fn signature_recovers_element_after_narrow_resize() {
    let wide = Document::from_value(json!({
        "viewport": {"width": 1440, "height": 900},
        "root": {"tag": "html", "children": [{"tag": "body", "children": [{"tag": "main", "children": [
            {"tag": "div", "attrs": {"class": "col-lg-4 panel-wide"}, "text": "Quarterly revenue grew"},
            {"tag": "div", "attrs": {"class": "col-lg-8 panel-wide"}, "text": "Headcount is flat"}
        ]}]}]}
    }))
    .expect("wide snapshot");
    let narrow = Document::from_value(json!({
        "viewport": {"width": 375, "height": 667},
        "root": {"tag": "html", "children": [{"tag": "body", "children": [{"tag": "main", "children": [
            {"tag": "div", "attrs": {"class": "col-12 stacked"}, "text": "Quarterly revenue grew"},
            {"tag": "div", "attrs": {"class": "col-12 stacked"}, "text": "Headcount is flat"}
        ]}]}]}
    }))
    .expect("narrow snapshot");

    let matcher = SignatureMatcher::default();
    let target = find_text(&wide, "div", "Quarterly revenue grew");
    let signature = matcher.create_signature(&wide, target).expect("signature");

    let found = matcher.find_by_signature(&narrow, &signature).expect("found");
    assert_eq!(found.tier, SignatureTier::TextContent);
    assert_eq!(narrow.text_sample(found.node, 100), "Quarterly revenue grew");
}
