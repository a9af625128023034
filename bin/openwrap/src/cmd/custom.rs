use crate::{config::Config, session::Session};
use clap::Args;
use openwrap_custom_rs::CustomBannerEventHandler;
use openwrap_rs::{main_looper, BannerView};
use tracing::info;

#[derive(Debug, Args)]
#[clap(about = "request one banner from the dummy custom-event ad server and report the winner")]
pub struct Command {
    #[clap(env, default_value = "config.toml")]
    config_file: String,

    #[clap(flatten)]
    session: Session,
}

impl Command {
    pub async fn execute(self) -> eyre::Result<()> {
        let config = Config::from_toml_file(&self.config_file)?;

        let Some(custom) = config.custom else {
            return Err(eyre::eyre!("missing custom config from file provided"))
        };
        info!(ad_unit = %custom.handler.ad_unit_id, "configured for dummy ad server");

        let (main_thread, looper) = main_looper();
        let handler = CustomBannerEventHandler::new(&custom.handler, custom.simulation, main_thread);
        let banner = BannerView::new(config.openwrap, handler);

        self.session.run(banner, looper, config.bid).await
    }
}
