#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rekindle_core::prelude::*;

    use crate::Document;

    thread_local! {
        static COUNT_CONTEXT: Context<i32> = create_context(0);
    }

    fn Button(props: &Props) -> Node {
        let mut attrs = Props::new();
        if let Some(handler) = props.handler("onClick") {
            attrs = attrs.listen("click", handler.clone());
        }
        h!("button", Some(attrs), props.get_str("label").unwrap_or("").to_string())
    }

    fn Counter(_: &Props) -> Node {
        let (count, set_count) = use_state(|| 0);
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
        )
    }

    fn App(_: &Props) -> Node {
        let (global, set_global) = use_state(|| 100);
        let increase = Props::new()
            .with("label", "Increase Global")
            .on("click", move |_| set_global.update(|c| c + 1));
        COUNT_CONTEXT.with(|ctx| {
            ctx.provide(
                global,
                [h!(
                    "div",
                    None,
                    h!("h1", None, "Mini React Demo"),
                    h!("p", None, format!("Global Count: {global}")),
                    h!(Component::new(Button), Some(increase)),
                    h!(Component::new(Counter), None),
                )],
            )
        })
    }

    fn GlobalBadge(_: &Props) -> Node {
        let global = COUNT_CONTEXT.with(|ctx| ctx.use_context());
        h!("em", None, global)
    }

    fn button(doc: &Document, label: &str) -> HostNode {
        doc.find_element(doc.body(), "button", label).unwrap()
    }

    #[test]
    fn test_counter_initial_render() {
        let doc = Document::new();
        let _root = mount(doc.clone(), doc.body(), h!(Component::new(Counter), None)).unwrap();

        insta::assert_snapshot!(
            doc.serialize(doc.body()),
            @"<body><div><p>Count: 0</p><button>+</button><button>-</button></div></body>"
        );
    }

    #[test]
    fn test_click_keeps_button_nodes() {
        let doc = Document::new();
        let root = mount(doc.clone(), doc.body(), h!(Component::new(Counter), None)).unwrap();
        let div = root.host_node().unwrap();
        let before = doc.children(div);
        let plus = button(&doc, "+");

        assert_eq!(doc.click(plus), 1);

        insta::assert_snapshot!(
            doc.serialize(div),
            @"<div><p>Count: 1</p><button>+</button><button>-</button></div>"
        );
        assert_eq!(doc.children(div), before);
        assert_eq!(button(&doc, "+"), plus);
        assert_eq!(doc.listener_count(plus), 1);

        doc.click(button(&doc, "-"));
        doc.click(button(&doc, "-"));
        assert_eq!(doc.text_content(before[0]), "Count: -1");
    }

    #[test]
    fn test_global_count_leaves_counter_alone() {
        let doc = Document::new();
        let _root = mount(doc.clone(), doc.body(), h!(Component::new(App), None)).unwrap();
        let counter_text = doc.find_element(doc.body(), "p", "Count: 0").unwrap();

        doc.click(button(&doc, "+"));
        doc.click(button(&doc, "Increase Global"));

        insta::assert_snapshot!(
            doc.serialize(doc.body()),
            @"<body><div><h1>Mini React Demo</h1><p>Global Count: 101</p><button>Increase Global</button><div><p>Count: 1</p><button>+</button><button>-</button></div></div></body>"
        );
        assert_eq!(doc.find_element(doc.body(), "p", "Count: 1"), Some(counter_text));
        assert_eq!(COUNT_CONTEXT.with(|ctx| ctx.current()), 101);
    }

    #[test]
    fn test_context_consumer_follows_provider() {
        let doc = Document::new();
        let slot: Rc<RefCell<Option<Setter<i32>>>> = Default::default();
        let app = {
            let slot = slot.clone();
            Component::new(move |_: &Props| {
                let (v, set) = use_state(|| 7);
                *slot.borrow_mut() = Some(set);
                COUNT_CONTEXT.with(|ctx| ctx.provide(v, [h!(Component::new(GlobalBadge), None)]))
            })
        };
        let root = mount(doc.clone(), doc.body(), h!(&app, None)).unwrap();
        insta::assert_snapshot!(doc.serialize(doc.body()), @"<body><em>7</em></body>");

        let set = slot.borrow().clone().unwrap();
        set.set(8);
        insta::assert_snapshot!(doc.serialize(doc.body()), @"<body><em>8</em></body>");

        let subscribers = COUNT_CONTEXT.with(|ctx| ctx.subscriber_count());
        assert_eq!(subscribers, 1);
        root.unmount();
        assert_eq!(COUNT_CONTEXT.with(|ctx| ctx.subscriber_count()), 0);
        assert!(doc.children(doc.body()).is_empty());
    }

    fn list_fixture(short_tag: &'static str) -> (Rc<Document>, Root, Setter<bool>) {
        let doc = Document::new();
        let slot: Rc<RefCell<Option<Setter<bool>>>> = Default::default();
        let list = {
            let slot = slot.clone();
            Component::new(move |_: &Props| {
                let (short, set) = use_state(|| false);
                *slot.borrow_mut() = Some(set);
                if short {
                    h!("ul", None, h!(short_tag, None, "a"))
                } else {
                    h!("ul", None, h!("li", None, "a"), h!("li", None, "b"), h!("li", None, "c"))
                }
            })
        };
        let root = mount(doc.clone(), doc.body(), h!(&list, None)).unwrap();
        let set = slot.borrow().clone().unwrap();
        (doc, root, set)
    }

    #[test]
    fn test_shrinking_list_keeps_matching_first_child() {
        let (doc, root, set) = list_fixture("li");
        let ul = root.host_node().unwrap();
        let children = doc.children(ul);

        set.set(true);

        assert_eq!(doc.children(ul), vec![children[0]]);
        assert!(!doc.is_attached(children[1]));
        assert!(!doc.is_attached(children[2]));
        insta::assert_snapshot!(doc.serialize(ul), @"<ul><li>a</li></ul>");
    }

    #[test]
    fn test_shrinking_list_replaces_changed_first_child() {
        let (doc, root, set) = list_fixture("span");
        let ul = root.host_node().unwrap();
        let children = doc.children(ul);

        set.set(true);

        let now = doc.children(ul);
        assert_eq!(now.len(), 1);
        assert_ne!(now[0], children[0]);
        assert_eq!(doc.tag(now[0]).as_deref(), Some("span"));
        insta::assert_snapshot!(doc.serialize(ul), @"<ul><span>a</span></ul>");
    }

    #[test]
    fn test_serialize_attributes_and_escaping() {
        let doc = Document::new();
        let _root = mount(
            doc.clone(),
            doc.body(),
            h!(
                "a",
                Some(
                    Props::new()
                        .with("href", "/x?a=1&b=2")
                        .with("tabIndex", 3)
                        .with("hidden", false)
                        .with("disabled", true)
                        .on("click", |_| {})
                ),
                "<one> & two"
            ),
        )
        .unwrap();

        insta::assert_snapshot!(
            doc.serialize(doc.body()),
            @r#"<body><a disabled href="/x?a=1&amp;b=2" tabIndex="3">&lt;one&gt; &amp; two</a></body>"#
        );
    }

    #[test]
    fn test_events_bubble_to_ancestors() {
        let doc = Document::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Default::default();
        let (outer, inner) = (log.clone(), log.clone());
        let root = mount(
            doc.clone(),
            doc.body(),
            h!(
                "section",
                Some(Props::new().on("click", move |_| outer.borrow_mut().push("section"))),
                h!(
                    "button",
                    Some(Props::new().on("click", move |e: Event| {
                        assert_eq!(&*e.kind, "click");
                        inner.borrow_mut().push("button")
                    })),
                    "go"
                )
            ),
        )
        .unwrap();

        let go = button(&doc, "go");
        assert_eq!(doc.click(go), 2);
        assert_eq!(*log.borrow(), vec!["button", "section"]);
        assert_eq!(doc.dispatch(go, "keydown"), 0);
        assert_eq!(root.host_node().and_then(|n| doc.tag(n)).as_deref(), Some("section"));
    }

    #[test]
    fn test_removed_property_is_dropped() {
        let doc = Document::new();
        let slot: Rc<RefCell<Option<Setter<bool>>>> = Default::default();
        let app = {
            let slot = slot.clone();
            Component::new(move |_: &Props| {
                let (titled, set) = use_state(|| true);
                *slot.borrow_mut() = Some(set);
                let props = if titled { Props::new().with("title", "hi") } else { Props::new() };
                h!("div", Some(props))
            })
        };
        let _root = mount(doc.clone(), doc.body(), h!(&app, None)).unwrap();
        insta::assert_snapshot!(doc.serialize(doc.body()), @r#"<body><div title="hi"></div></body>"#);

        let set = slot.borrow().clone().unwrap();
        set.set(false);
        insta::assert_snapshot!(doc.serialize(doc.body()), @"<body><div></div></body>");
    }

    #[test]
    fn test_repeated_updates_free_replaced_nodes() {
        let doc = Document::new();
        let slot: Rc<RefCell<Option<Setter<i32>>>> = Default::default();
        let app = {
            let slot = slot.clone();
            Component::new(move |_: &Props| {
                let (n, set) = use_state(|| 0);
                *slot.borrow_mut() = Some(set);
                h!("p", None, n)
            })
        };
        let root = mount(doc.clone(), doc.body(), h!(&app, None)).unwrap();
        assert_eq!(doc.node_count(), 3);

        let set = slot.borrow().clone().unwrap();
        for n in 1..=1000 {
            set.set(n);
        }
        insta::assert_snapshot!(doc.serialize(doc.body()), @"<body><p>1000</p></body>");
        assert_eq!(doc.node_count(), 3);

        root.unmount();
        assert_eq!(doc.node_count(), 1);
    }
}
