//! Validation and render cascades

use formwork_forms::{
    Container, Element, ElementKind, Form, FormConfig, Group, Options, RequestData, Renderer,
    Rule, ScriptBuilder, ValueMap,
};
use serde_json::{json, Value};

fn posted(id: &str, body: Value) -> anyhow::Result<Form> {
    let body: ValueMap = match body {
        Value::Object(map) => map,
        _ => anyhow::bail!("request body must be an object"),
    };
    let request = RequestData::new("/signup").with_body(body);
    Ok(Form::new(id, FormConfig::new().request(request))?)
}

fn field(kind: ElementKind, name: &str, rule: Rule) -> Element {
    let element = Element::new(kind, name);
    element.add_rule(rule);
    element
}

#[test]
fn test_unsubmitted_form_is_never_valid() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;
    let email = field(ElementKind::Text, "email", Rule::required("Email is required"));
    form.append_child(email.clone())?;

    assert!(!form.validate());
    // Rules were not run
    assert_eq!(email.error(), None);
    Ok(())
}

#[test]
fn test_unsubmitted_form_node_is_never_valid() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;
    let x = field(ElementKind::Text, "x", Rule::required("x is required"));
    x.set_value("ok");
    form.append_child(x.clone())?;

    assert!(!form.validate());
    assert!(!form.node().validate());

    let as_node = form.get_element_by_id("qf:f1").and_then(|hidden| hidden.container());
    assert!(as_node.is_some_and(|node| !node.validate()));
    assert_eq!(x.error(), None);
    Ok(())
}

#[test]
fn test_submitted_form_node_validates_tree() -> anyhow::Result<()> {
    let form = posted("f1", json!({"_qf__f1": "", "x": ""}))?;
    let x = field(ElementKind::Text, "x", Rule::required("x is required"));
    form.append_child(x.clone())?;

    assert!(!form.node().validate());
    assert_eq!(x.error().as_deref(), Some("x is required"));
    Ok(())
}

#[test]
fn test_validation_does_not_short_circuit() -> anyhow::Result<()> {
    let form = posted("f1", json!({"_qf__f1": "", "email": "", "nick": "a"}))?;
    let email = field(ElementKind::Text, "email", Rule::required("Email is required"));
    let nick = field(ElementKind::Text, "nick", Rule::min_length(3, "Nick is too short"));
    form.append_child(email.clone())?;
    form.append_child(nick.clone())?;

    assert!(!form.validate());
    assert_eq!(email.error().as_deref(), Some("Email is required"));
    assert_eq!(nick.error().as_deref(), Some("Nick is too short"));
    Ok(())
}

#[test]
fn test_first_failing_rule_wins() -> anyhow::Result<()> {
    let form = posted("f1", json!({"_qf__f1": "", "nick": "abcdefgh"}))?;
    let nick = Element::new(ElementKind::Text, "nick");
    nick.add_rule(Rule::required("required"));
    nick.add_rule(Rule::max_length(4, "too long"));
    nick.add_rule(Rule::equals("abcd", "wrong nick"));
    form.append_child(nick.clone())?;

    assert!(!form.validate());
    assert_eq!(nick.error().as_deref(), Some("too long"));
    Ok(())
}

#[test]
fn test_valid_form_clears_stale_errors() -> anyhow::Result<()> {
    let form = posted("f1", json!({"_qf__f1": "", "email": "ada@example.com"}))?;
    let email = field(ElementKind::Text, "email", Rule::required("Email is required"));
    email.set_error(Some("stale".to_string()));
    form.append_child(email.clone())?;

    assert!(form.validate());
    assert_eq!(email.error(), None);
    Ok(())
}

#[test]
fn test_group_and_form_rules() -> anyhow::Result<()> {
    let form = posted(
        "f1",
        json!({"_qf__f1": "", "pw": {"first": "hunter2", "again": "hunter3"}}),
    )?;
    let passwords = Group::named("pw");
    passwords.add_rule(Rule::callback(
        |value| value.is_some_and(|v| v.get("first") == v.get("again")),
        "Passwords differ",
    ));
    passwords.append_child(Element::new(ElementKind::Password, "first"))?;
    passwords.append_child(Element::new(ElementKind::Password, "again"))?;
    form.append_child(passwords.clone())?;
    form.add_rule(Rule::callback(
        |value| value.is_some_and(|v| v.get("pw").is_some()),
        "Nothing submitted",
    ));

    assert!(!form.validate());
    assert_eq!(passwords.error().as_deref(), Some("Passwords differ"));
    assert_eq!(form.error(), None);
    Ok(())
}

#[derive(Default)]
struct RecordingRenderer {
    events: Vec<String>,
    script: ScriptBuilder,
}

impl Renderer for RecordingRenderer {
    fn start_form(&mut self, form: &Form) {
        self.events
            .push(format!("start_form {}", form.id().unwrap_or_default()));
    }

    fn finish_form(&mut self, form: &Form) {
        self.events
            .push(format!("finish_form {}", form.id().unwrap_or_default()));
    }

    fn start_group(&mut self, group: &Group) {
        self.events
            .push(format!("start_group {}", group.name().unwrap_or_default()));
    }

    fn finish_group(&mut self, group: &Group) {
        self.events
            .push(format!("finish_group {}", group.name().unwrap_or_default()));
    }

    fn render_element(&mut self, element: &Element) {
        self.events
            .push(format!("element {}", element.name().unwrap_or_default()));
    }

    fn script_builder(&mut self) -> &mut ScriptBuilder {
        &mut self.script
    }
}

#[test]
fn test_render_visits_tree_in_order() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;
    let addr = Group::named("addr");
    let city = Element::new(ElementKind::Text, "city");
    city.add_rule(Rule::required("City is required").client_side());
    city.add_rule(Rule::min_length(2, "City is too short"));
    addr.append_child(city)?;
    form.append_child(addr)?;
    form.append_child(Element::new(ElementKind::Submit, "send"))?;

    let mut renderer = RecordingRenderer::default();
    form.render(&mut renderer);

    assert_eq!(
        renderer.events,
        vec![
            "start_form f1",
            "element _qf__f1",
            "start_group addr",
            "element addr[city]",
            "finish_group addr",
            "element send",
            "finish_form f1",
        ]
    );

    assert_eq!(renderer.script.form_id(), Some("f1"));
    let rules = renderer.script.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].field, "addr[city]");
    assert_eq!(rules[0].rule, "required");
    Ok(())
}

#[test]
fn test_render_from_a_group() -> anyhow::Result<()> {
    let group = Group::named("g");
    group.append_child(Element::new(ElementKind::Text, "x"))?;

    let mut renderer = RecordingRenderer::default();
    group.render(&mut renderer);

    assert_eq!(
        renderer.events,
        vec!["start_group g", "element g[x]", "finish_group g"]
    );
    assert!(renderer.script.is_empty());
    Ok(())
}

#[test]
fn test_string_rendering() -> anyhow::Result<()> {
    let form = Form::new(
        "s",
        FormConfig::new()
            .track_submit(false)
            .request(RequestData::new("/go")),
    )?;
    let group = Group::named("g");
    group.append_child(Element::new(ElementKind::Text, "a"))?;
    group.append_child(Element::new(ElementKind::Text, "b"))?;
    form.append_child(group)?;

    assert_eq!(
        form.to_html(&Options::default()),
        "<form action=\"/go\" id=\"s\" method=\"post\">\n\
         <input name=\"g[a]\" type=\"text\" />\n\
         <input name=\"g[b]\" type=\"text\" />\n\
         </form>"
    );

    let compact = Options {
        linebreak: String::new(),
    };
    assert_eq!(
        form.to_html(&compact),
        "<form action=\"/go\" id=\"s\" method=\"post\">\
         <input name=\"g[a]\" type=\"text\" />\
         <input name=\"g[b]\" type=\"text\" />\
         </form>"
    );
    assert_eq!(form.to_string(), form.to_html(&Options::default()));
    Ok(())
}
