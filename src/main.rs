use anyhow::Result;

mod assets;
mod camera;
mod config;
mod controls;
mod demo;
mod explosion;
mod model;
mod rendering;
mod scene_graph;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    pollster::block_on(window::run())?;

    Ok(())
}
