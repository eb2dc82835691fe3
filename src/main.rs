mod app;
mod backend;
mod components;
mod compress;
mod config;
mod error;
pub mod models;
pub mod utils;
use app::App;

fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
