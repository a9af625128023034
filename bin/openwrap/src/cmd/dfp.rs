use crate::{config::Config, session::Session};
use clap::Args;
use openwrap_dfp_rs::{DfpBannerEventHandler, SimulatedAdView};
use openwrap_rs::{main_looper, BannerView};
use tracing::info;

#[derive(Debug, Args)]
#[clap(about = "request one banner from a simulated DFP ad unit and report the winner")]
pub struct Command {
    #[clap(env, default_value = "config.toml")]
    config_file: String,

    #[clap(flatten)]
    session: Session,
}

impl Command {
    pub async fn execute(self) -> eyre::Result<()> {
        let config = Config::from_toml_file(&self.config_file)?;

        let Some(dfp) = config.dfp else {
            return Err(eyre::eyre!("missing dfp config from file provided"))
        };
        info!(ad_unit = %dfp.handler.ad_unit_id, "configured for DFP");

        let (main_thread, looper) = main_looper();
        let ad_view = SimulatedAdView::new(
            &dfp.handler.ad_unit_id,
            dfp.handler.ad_sizes.clone(),
            dfp.simulation,
            main_thread.clone(),
        );
        let handler = DfpBannerEventHandler::new(ad_view, main_thread, &dfp.handler);
        let banner = BannerView::new(config.openwrap, handler);

        self.session.run(banner, looper, config.bid).await
    }
}
