mod app;
mod config;
mod field;
mod input;
mod noise;
mod particle;
mod render;
mod sim;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
