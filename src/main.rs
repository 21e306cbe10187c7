use chrono::Local;
use color_eyre::Result;
use guestbook_tui::app::App;
use guestbook_tui::config::Config;
use guestbook_tui::form_state::FormController;
use guestbook_tui::telemetry;
use guestbook_tui::transport::HttpTransport;
use guestbook_tui::ui::UI;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    telemetry::init(config.log_file.as_deref())?;

    match &config.endpoint {
        Ok(url) => tracing::info!(endpoint = %url, policy = ?config.response_policy, "Starting guestbook"),
        Err(e) => tracing::warn!(error = %e, "Starting guestbook without a usable endpoint"),
    }

    let transport = HttpTransport::new(config.response_policy);
    let controller = FormController::new(config.endpoint);
    let app = App::new(config.shell, controller, transport, Local::now().date_naive());

    let mut ui = UI::new()?;
    app.run(&mut ui).await
}
