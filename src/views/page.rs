use minijinja::{context, AutoEscape, Environment};
use supervisor_web::config::ServerConfig;

const PAGE_TEMPLATE_NAME: &str = "index.html";
const PAGE_TEMPLATE: &str = include_str!("../../templates/index.html");
const PAGE_TITLE: &str = "Supervisord Process Control";

pub fn render_page(config: &ServerConfig) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
    let template = env.get_template(PAGE_TEMPLATE_NAME)?;
    template.render(context! {
        title => PAGE_TITLE,
        api_url => &config.api_url,
    })
}
