use csl_tunnel_runner::prelude::*;
use otns_client::otns_engine;

fn main() -> TunnelResult<()> {
    let builder = SweepDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
        .with_default_domain(&DEFAULT_DOMAIN)
        .with_default_radio_model(RadioModel::MutualInterference)
        .use_engine(otns_engine);

    run(builder)?;

    Ok(())
}
