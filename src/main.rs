use clap::Parser;

use yubino::config::Config;

fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("yubino")
        .enable_all()
        .build()?;

    if cfg.wipe {
        runtime.block_on(yubino::wipe(cfg))
    } else {
        runtime.block_on(yubino::run(cfg))
    }
}
