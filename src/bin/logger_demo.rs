use jwt_pair::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "jwt_pair=debug,logger_demo=trace".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");

    // An invalid directive leaves the previous filter in place.
    let rejected = logger.reload_from_config(&LogConfig {
        filter: "=[".to_string(),
    });
    warn!(rejected = rejected.is_err(), "invalid filter reload");

    Ok(())
}
