use crate::config::Config;
use clap::Args;
use tracing::info;

#[derive(Debug, Args)]
#[clap(about = "check a config file and summarize how each ad server would be driven")]
pub struct Command {
    #[clap(env, default_value = "config.toml")]
    config_file: String,

    /// also print the full parsed config
    #[clap(long)]
    verbose: bool,
}

impl Command {
    pub async fn execute(self) -> eyre::Result<()> {
        let config = Config::from_toml_file(&self.config_file)?;

        let inventory = &config.openwrap;
        info!(
            pub_id = %inventory.pub_id,
            profile_id = inventory.profile_id,
            ad_unit_id = %inventory.ad_unit_id,
            "header bidding inventory"
        );
        match &config.bid {
            Some(bid) if bid.is_non_zero() => info!(%bid, "requests carry a bid"),
            Some(bid) => info!(%bid, "zero price bid, the ad server wins without a window"),
            None => info!("no bid, the ad server wins without a window"),
        }

        #[cfg(feature = "dfp")]
        {
            if let Some(dfp) = &config.dfp {
                info!(
                    ad_unit_id = %dfp.handler.ad_unit_id,
                    win_key = %dfp.handler.win_key,
                    window = ?dfp.handler.arbiter.signal_timeout(),
                    serve_partner = dfp.simulation.serve_partner,
                    "dfp ad server"
                );
            }
        }
        #[cfg(feature = "custom")]
        {
            if let Some(custom) = &config.custom {
                info!(
                    ad_unit_id = %custom.handler.ad_unit_id,
                    custom_event = %custom.handler.custom_event,
                    serve_partner = custom.simulation.serve_partner,
                    "custom ad server"
                );
            }
        }

        if self.verbose {
            info!("{config:#?}");
        }
        Ok(())
    }
}
