//! Forms: submission detection, data sources, filters and read-only state

use std::rc::Rc;

use formwork_forms::{
    tracking_field_name, ArrayDataSource, Container, DataSource, Element, ElementKind, Form,
    FormConfig, FormError, Group, Method, RequestData, ValueMap,
};
use serde_json::{json, Value};

fn map(value: Value) -> ValueMap {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn posted(body: Value) -> FormConfig {
    FormConfig::new()
        .method("POST")
        .request(RequestData::new("/signup").with_body(map(body)))
}

fn untracked() -> FormConfig {
    FormConfig::new().track_submit(false)
}

fn text(name: &str) -> Element {
    Element::new(ElementKind::Text, name)
}

#[test]
fn test_submitted_form_resolves_group_values() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"_qf__f1": "", "addr": {"city": "Oslo"}})))?;
    let addr = Group::named("addr");
    let city = text("city");
    addr.append_child(city.clone())?;
    form.append_child(addr.clone())?;

    assert!(form.is_submitted());
    assert_eq!(city.name().as_deref(), Some("addr[city]"));
    assert_eq!(city.value(), Some(json!("Oslo")));
    assert_eq!(addr.value(), Some(json!({"city": "Oslo"})));
    assert_eq!(form.value(), map(json!({"addr": {"city": "Oslo"}})));
    Ok(())
}

#[test]
fn test_tracking_field() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;
    assert_eq!(tracking_field_name("f1"), "_qf__f1");

    let children = form.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name().as_deref(), Some("_qf__f1"));
    assert_eq!(children[0].id().as_deref(), Some("qf:f1"));
    assert!(form.get_element_by_id("qf:f1").is_some());
    Ok(())
}

#[test]
fn test_request_without_tracking_field_is_not_submitted() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"city": "Oslo"})))?;
    let city = text("city");
    form.append_child(city.clone())?;

    assert!(!form.is_submitted());
    assert!(form.data_sources().is_empty());
    assert_eq!(city.value(), None);
    Ok(())
}

#[test]
fn test_untracked_form_uses_any_request_data() -> anyhow::Result<()> {
    let with_data = Form::new(
        "f1",
        untracked().request(RequestData::new("/").with_body(map(json!({"q": "rust"})))),
    )?;
    assert!(with_data.is_submitted());
    assert!(with_data.is_empty());

    let without_data = Form::new("f1", untracked())?;
    assert!(!without_data.is_submitted());
    Ok(())
}

#[test]
fn test_empty_id_disables_tracking() -> anyhow::Result<()> {
    let form = Form::new("", FormConfig::new())?;
    assert!(form.is_empty());
    assert_eq!(form.id(), None);
    Ok(())
}

#[test]
fn test_get_form_reads_query() -> anyhow::Result<()> {
    let request = RequestData::new("/search")
        .with_query(map(json!({"_qf__s": "", "q": "from query"})))
        .with_body(map(json!({"q": "from body"})));
    let form = Form::new("s", FormConfig::new().method("get").request(request))?;
    let q = text("q");
    form.append_child(q.clone())?;

    assert_eq!(form.method(), Method::Get);
    assert!(form.is_submitted());
    assert_eq!(q.value(), Some(json!("from query")));
    Ok(())
}

#[test]
fn test_action_defaults_to_request_url() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({})))?;
    assert_eq!(form.action().as_deref(), Some("/signup"));

    let form = Form::new("f2", posted(json!({})).action("/elsewhere"))?;
    assert_eq!(form.action().as_deref(), Some("/elsewhere"));
    assert_eq!(form.attribute("method").as_deref(), Some("post"));
    Ok(())
}

#[test]
fn test_read_only_attributes() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;

    assert_eq!(form.set_id("other"), Err(FormError::read_only("id")));
    assert_eq!(form.set_name("other"), Err(FormError::read_only("name")));
    assert!(form.set_attribute("id", "other").unwrap_err().is_read_only());
    assert!(form.set_attribute("method", "get").unwrap_err().is_read_only());
    assert!(form.remove_attribute("method").unwrap_err().is_read_only());
    assert!(form.node().set_name("other").unwrap_err().is_read_only());

    assert_eq!(form.id().as_deref(), Some("f1"));
    assert_eq!(form.method(), Method::Post);

    form.set_attribute("class", "wide")?;
    assert_eq!(form.attribute("class").as_deref(), Some("wide"));
    Ok(())
}

#[test]
fn test_container_set_value_is_unsupported() -> anyhow::Result<()> {
    let form = Form::new("f1", FormConfig::new())?;
    let group = Group::named("g");

    assert!(matches!(
        form.set_value(json!({"a": 1})),
        Err(FormError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        form.node().set_value(json!(1)),
        Err(FormError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        group.set_value(json!(1)),
        Err(FormError::UnsupportedOperation(_))
    ));
    Ok(())
}

#[test]
fn test_data_source_priority() -> anyhow::Result<()> {
    let form = Form::new("f1", untracked())?;
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "A", "zip": null}))));
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "B", "zip": "0150"}))));

    let city = text("city");
    let zip = text("zip");
    let country = text("country");
    country.set_value("NO");
    form.append_child(city.clone())?;
    form.append_child(zip.clone())?;
    form.append_child(country.clone())?;

    assert_eq!(city.value(), Some(json!("A")));
    // A null hit does not count
    assert_eq!(zip.value(), Some(json!("0150")));
    assert_eq!(country.value(), Some(json!("NO")));
    Ok(())
}

#[test]
fn test_set_data_sources_re_resolves_values() -> anyhow::Result<()> {
    let form = Form::new("f1", untracked())?;
    let city = text("city");
    city.set_value("default");
    form.append_child(city.clone())?;
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "A"}))));
    assert_eq!(city.value(), Some(json!("A")));

    let sources: Vec<Rc<dyn DataSource>> =
        vec![Rc::new(ArrayDataSource::new(map(json!({"city": "B"}))))];
    form.set_data_sources(sources);
    assert_eq!(city.value(), Some(json!("B")));

    form.set_data_sources(Vec::new());
    assert_eq!(city.value(), Some(json!("default")));
    Ok(())
}

#[test]
fn test_set_data_sources_json_is_atomic() -> anyhow::Result<()> {
    let form = Form::new("f1", untracked())?;
    let city = text("city");
    form.append_child(city.clone())?;

    form.set_data_sources_json(json!([{"city": "X"}]))?;
    assert_eq!(city.value(), Some(json!("X")));

    let err = form
        .set_data_sources_json(json!([{"city": "Y"}, 5]))
        .unwrap_err();
    assert!(matches!(err, FormError::InvalidInput(_)));
    assert_eq!(form.data_sources().len(), 1);
    assert_eq!(city.value(), Some(json!("X")));

    assert!(matches!(
        form.set_data_sources_json(json!({"city": "Z"})),
        Err(FormError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn test_renamed_element_re_resolves() -> anyhow::Result<()> {
    let form = Form::new("f1", untracked())?;
    form.add_data_source(ArrayDataSource::new(map(json!({"a": {"x": 1}, "b": {"x": 2}}))));
    let group = Group::named("a");
    let x = text("x");
    group.append_child(x.clone())?;
    form.append_child(group.clone())?;
    assert_eq!(x.value(), Some(json!(1)));

    group.set_name("b");
    assert_eq!(x.value(), Some(json!(2)));
    Ok(())
}

#[test]
fn test_filters_run_in_order_and_skip_internal_fields() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"_qf__f1": "", "name": "ada"})))?;
    let name = text("name");
    form.append_child(name.clone())?;

    form.add_filter(|mut values: ValueMap| {
        values.insert("step".to_string(), json!("first"));
        values
    });
    form.add_filter(|mut values: ValueMap| {
        let previous = values
            .get("step")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        values.insert("step".to_string(), json!(format!("{}+second", previous)));
        values
    });

    let values = form.value();
    assert_eq!(values.get("step"), Some(&json!("first+second")));
    assert_eq!(values.get("name"), Some(&json!("ada")));
    assert!(values.keys().all(|key| !key.starts_with("_qf")));
    assert!(form.submitted_value().keys().all(|key| !key.starts_with("_qf")));
    Ok(())
}

#[test]
fn test_element_filters_feed_form_value() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"_qf__f1": "", "name": "  ada  "})))?;
    let name = text("name");
    name.add_filter(|value| json!(value.as_str().unwrap_or_default().trim()));
    form.append_child(name.clone())?;

    assert_eq!(form.value(), map(json!({"name": "ada"})));
    assert_eq!(name.raw_value(), Some(json!("  ada  ")));
    Ok(())
}

#[test]
fn test_frozen_element_skips_submitted_values() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"_qf__f1": "", "city": "Posted"})))?;
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "Stored"}))));

    let city = text("city");
    city.freeze(true);
    form.append_child(city.clone())?;
    assert_eq!(city.value(), Some(json!("Stored")));
    assert_eq!(form.value().get("city"), Some(&json!("Stored")));
    assert_eq!(form.submitted_value().get("city"), None);

    city.set_persistent_freeze(true);
    assert_eq!(city.value(), Some(json!("Posted")));
    assert_eq!(form.submitted_value().get("city"), Some(&json!("Posted")));
    Ok(())
}

#[test]
fn test_freezing_attached_element_re_resolves() -> anyhow::Result<()> {
    let form = Form::new("f1", posted(json!({"_qf__f1": "", "city": "Posted"})))?;
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "Stored"}))));
    let city = text("city");
    form.append_child(city.clone())?;
    assert_eq!(city.value(), Some(json!("Posted")));

    city.freeze(true);
    assert_eq!(city.value(), Some(json!("Stored")));

    city.freeze(false);
    assert_eq!(city.value(), Some(json!("Posted")));

    // Freezing the whole form cascades the same way
    form.freeze(true);
    assert_eq!(city.value(), Some(json!("Stored")));
    Ok(())
}

#[test]
fn test_default_set_after_attach_keeps_source_value() -> anyhow::Result<()> {
    let form = Form::new("f1", untracked())?;
    form.add_data_source(ArrayDataSource::new(map(json!({"city": "FromSource"}))));
    let city = text("city");
    let zip = text("zip");
    form.append_child(city.clone())?;
    form.append_child(zip.clone())?;

    city.set_value("default");
    zip.set_value("0150");

    assert_eq!(city.value(), Some(json!("FromSource")));
    assert_eq!(city.default_value(), Some(json!("default")));
    assert_eq!(zip.value(), Some(json!("0150")));
    assert_eq!(form.value(), map(json!({"city": "FromSource", "zip": "0150"})));

    form.set_data_sources(Vec::new());
    assert_eq!(city.value(), Some(json!("default")));
    Ok(())
}

#[test]
fn test_form_config_from_json() -> anyhow::Result<()> {
    let config = FormConfig::from_json(
        r#"{
            "method": "GET",
            "track_submit": false,
            "request": {"url": "/find", "query": {"q": "x"}}
        }"#,
    )?;
    assert_eq!(config.method, Method::Get);
    assert!(!config.track_submit);

    let form = Form::new("find", config)?;
    assert!(form.is_submitted());
    assert_eq!(form.action().as_deref(), Some("/find"));

    assert!(matches!(
        FormConfig::from_json("{\"track_submit\": 3}"),
        Err(FormError::InvalidInput(_))
    ));
    Ok(())
}
