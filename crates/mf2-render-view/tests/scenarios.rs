use std::rc::Rc;

use mf2_render_view::{
    Args, Bundle, Composer, ComposerOptions, Mf2, Mf2Message, Mf2Options, RuntimeError, UiNode,
    Value, use_mf2,
};

fn mf2() -> Mf2 {
    Mf2::new(
        Mf2Options::new("en-US")
            .with_bundle(
                Bundle::new("en-US")
                    .with_message("terms", "Please {#bold}read this{/bold}.")
                    .with_message("help", "See {#link to=|/help|}Help{/link}")
                    .with_message("broken", "Hello {")
                    .with_message("greeting", "Hello {$name}")
                    .with_message("status", ".input {$status :string}\n.match $status\nok {{Success}}\n* {{Unknown}}")
                    .with_message("bad-number", "Total: {$n :number}"),
            )
            .with_bundle(Bundle::new("fr").with_message("greeting", "Bonjour {$name}")),
    )
    .expect("mf2")
}

#[test]
fn bold_markup_renders_strong() {
    let node = Mf2Message::new("terms").render(&mf2());
    assert_eq!(node.to_html(), "<span>Please <strong>read this</strong>.</span>");
}

#[test]
fn link_markup_renders_anchor() {
    let node = Mf2Message::new("help").render(&mf2());
    assert_eq!(node.to_html(), r#"<span>See <a href="/help">Help</a></span>"#);
}

#[test]
fn missing_key_degrades_to_key() {
    let ctx = use_mf2(Some(&mf2())).expect("ctx");
    assert_eq!(ctx.t("missing.key", &Args::new()), "missing.key");
    assert!(ctx.tp("missing.key", &Args::new()).is_empty());
}

#[test]
fn malformed_pattern_degrades_to_raw_text() {
    let ctx = use_mf2(Some(&mf2())).expect("ctx");
    assert_eq!(ctx.t("broken", &Args::new()), "Hello {");
    assert_eq!(ctx.mf2().global().cached_formatters(), 0);
}

#[test]
fn duplicate_locale_is_a_construction_error() {
    let err = Composer::new(
        ComposerOptions::new("en-US")
            .with_bundle(Bundle::new("en-US"))
            .with_bundle(Bundle::new("en-US")),
    )
    .expect_err("should fail");
    assert!(matches!(err, RuntimeError::DuplicateLocale(_)));
    assert!(err.to_string().contains("en-US"));
}

#[test]
fn empty_parts_fall_back_to_plain_string() {
    let node = Mf2Message::new("bad-number")
        .with_arg("n", "lots")
        .render(&mf2());
    assert_eq!(
        node,
        UiNode::element("span", vec![UiNode::text("Total: {$n :number}")])
    );
}

#[test]
fn variables_render_isolated_text() {
    let node = Mf2Message::new("greeting").with_arg("name", "Ada").render(&mf2());
    assert_eq!(node.text_content(), "Hello Ada");
}

#[test]
fn variable_slot_replaces_value() {
    let node = Mf2Message::new("greeting")
        .with_arg("name", "Ada")
        .with_slot("name", |props| {
            Ok(UiNode::element("em", vec![UiNode::text(props.value.to_string())]))
        })
        .render(&mf2());
    assert_eq!(node.to_html(), "<span>Hello <em>Ada</em></span>");
}

#[test]
fn selection_renders_chosen_variant() {
    let mf2 = mf2();
    let ok = Mf2Message::new("status").with_arg("status", "ok").render(&mf2);
    let other = Mf2Message::new("status").with_arg("status", "late").render(&mf2);
    assert_eq!(ok.to_html(), "<span>Success</span>");
    assert_eq!(other.to_html(), "<span>Unknown</span>");
}

#[test]
fn locale_switch_applies_to_next_render() {
    let mf2 = mf2();
    let message = Mf2Message::new("greeting").with_arg("name", Value::from("Ada"));
    let before = message.render(&mf2);
    mf2.global().set_locale("fr");
    let after = message.render(&mf2);
    assert_eq!(before.text_content(), "Hello Ada");
    assert_eq!(after.text_content(), "Bonjour Ada");
}

#[test]
fn repeated_renders_reuse_cached_formatter() {
    let mf2 = mf2();
    let message = Mf2Message::new("greeting").with_arg("name", "Ada");
    let first = message.render(&mf2);
    let cached = mf2.global().cached_formatters();
    let second = message.render(&mf2);
    assert_eq!(first, second);
    assert_eq!(mf2.global().cached_formatters(), cached);

    let a = mf2
        .global()
        .formatter("en-US", "greeting", "Hello {$name}")
        .expect("formatter");
    let b = mf2
        .global()
        .formatter("en-US", "greeting", "Hello {$name}")
        .expect("formatter");
    assert!(Rc::ptr_eq(&a, &b));
}
