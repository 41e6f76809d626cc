use formwork_forms::{
    ArrayDataSource, Container, Element, ElementKind, Form, FormConfig, Group, Options,
    RequestData, Rule,
};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let body = json!({
        "_qf__register": "",
        "email": "",
        "addr": {"city": "Oslo"}
    });
    let request = RequestData::new("/register").with_body(body.as_object().cloned().unwrap_or_default());

    let form = match Form::new("register", FormConfig::new().method("POST").request(request)) {
        Ok(form) => form,
        Err(e) => {
            eprintln!("❌ Could not build form: {}", e);
            std::process::exit(1);
        }
    };
    form.add_data_source(ArrayDataSource::new(
        json!({"addr": {"country": "NO"}})
            .as_object()
            .cloned()
            .unwrap_or_default(),
    ));

    let email = Element::new(ElementKind::Text, "email");
    email.set_label("Email");
    email.add_rule(Rule::required("Email is required").client_side());

    let addr = Group::named("addr");
    let city = Element::new(ElementKind::Text, "city");
    let country = Element::new(ElementKind::Text, "country");

    let built = addr
        .append_child(city)
        .and_then(|_| addr.append_child(country))
        .and_then(|_| form.append_child(email.clone()))
        .and_then(|_| form.append_child(addr))
        .and_then(|_| form.append_child(Element::new(ElementKind::Submit, "send")));
    if let Err(e) = built {
        eprintln!("❌ Could not build form: {}", e);
        std::process::exit(1);
    }

    println!("Submitted: {}", form.is_submitted());
    println!("Valid: {}", form.validate());
    if let Some(error) = email.error() {
        println!("Email error: {}", error);
    }
    println!("Values: {}", json!(form.value()));
    println!("{}", "=".repeat(80));
    println!("{}", form.to_html(&Options::default()));
    println!("{}", "=".repeat(80));
}
