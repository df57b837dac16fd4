#![allow(non_snake_case)]

use anyhow::Context as _;
use rekindle_core::prelude::*;
use rekindle_dom::Document;

thread_local! {
    static GLOBAL_COUNT: Context<i32> = create_context(0);
}

fn Button(props: &Props) -> Node {
    let mut attrs = Props::new();
    if let Some(handler) = props.handler("onClick") {
        attrs = attrs.listen("click", handler.clone());
    }
    h!("button", Some(attrs), props.get_str("label").unwrap_or("").to_string())
}

fn GlobalBadge(_: &Props) -> Node {
    let global = GLOBAL_COUNT.with(|ctx| ctx.use_context());
    h!("small", None, format!("(global {global})"))
}

fn Counter(_: &Props) -> Node {
    let (count, set_count) = use_state(|| 0);
    use_effect_with(count, move || {
        log::info!("count is now {count}");
        None
    });

    let dec = set_count.clone();
    h!(
        "div",
        None,
        h!("p", None, format!("Count: {count}")),
        h!(
            Component::new(Button),
            Some(Props::new().with("label", "+").on("click", move |_| set_count.update(|c| c + 1)))
        ),
        h!(
            Component::new(Button),
            Some(Props::new().with("label", "-").on("click", move |_| dec.update(|c| c - 1)))
        ),
        h!(Component::new(GlobalBadge), None),
    )
}

fn App(_: &Props) -> Node {
    let (global, set_global) = use_state(|| 100);
    let increase = Props::new()
        .with("label", "Increase Global")
        .on("click", move |_| set_global.update(|c| c + 1));

    GLOBAL_COUNT.with(|ctx| {
        ctx.provide(
            global,
            [h!(
                "div",
                None,
                h!("h1", None, "Rekindle Demo"),
                h!("p", None, format!("Global Count: {global}")),
                h!(Component::new(Button), Some(increase)),
                h!(Component::new(Counter), None),
            )],
        )
    })
}

fn click(doc: &Document, label: &str) -> anyhow::Result<()> {
    let target = doc
        .find_element(doc.body(), "button", label)
        .with_context(|| format!("no button labelled {label:?}"))?;
    doc.click(target);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let doc = Document::new();
    let root = mount(doc.clone(), doc.body(), h!(Component::new(App), None))?;
    println!("{}", doc.serialize(doc.body()));

    for label in ["+", "+", "Increase Global", "-"] {
        click(&doc, label)?;
        root.run_until_idle();
        println!("{}", doc.serialize(doc.body()));
    }

    root.unmount();
    log::info!("unmounted; {} host nodes were created", doc.node_count());
    Ok(())
}
