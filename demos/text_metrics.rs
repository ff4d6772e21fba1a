//! Text demo: draws a line of text with a caret placed from measured
//! metrics, the way an entry widget positions its cursor. Writes
//! `text_metrics.png`.
//!
//! Run with: `cargo run --example text_metrics --features backend_cairo`

use std::fs::File;
use std::io::BufWriter;

use lumen::render::backends::cairo::create_view;
use lumen::render::surface::{RgbaImage, SurfaceSize};
use lumen::render::view::View;
use lumen::{Bounds, Font, Graphics, Rectangle, RenderConfig};

const WIDTH: u32 = 400;
const HEIGHT: u32 = 80;

fn paint(g: &mut Graphics<'_>) {
    let text = "hello metrics";
    let cursor = 5; // caret after "hello"

    g.set_color(0xff000000u32);
    g.fill_rect(Rectangle::new(0.0, 0.0, WIDTH as f64, HEIGHT as f64));

    g.set_color(0xffffffffu32);
    g.set_font(Font::new(18.0));

    let fm = g.context().font_metrics();
    let text_y = (HEIGHT as f64 - fm.height) / 2.0 + fm.ascent;
    g.draw_text(text, 8.0, text_y);

    // Caret sits after the measured prefix.
    let prefix = &text[..cursor];
    let tm = g.context().text_metrics(prefix);
    let caret_x = 8.0 + tm.x_advance + 2.0;
    g.fill_rect(Rectangle::new(caret_x, text_y - fm.ascent, 2.0, fm.height));
}

fn write_png(path: &str, img: &RgbaImage) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), img.width, img.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgba = Vec::with_capacity((img.width * img.height * 4) as usize);
    for y in 0..img.height {
        let row = &img.pixels[(y * img.stride) as usize..];
        for x in 0..img.width as usize {
            let o = x * 4;
            let (b, g, r, a) = (row[o], row[o + 1], row[o + 2], row[o + 3]);
            if a == 0 {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                let un = |c: u8| ((c as u32 * 255) / a as u32).min(255) as u8;
                rgba.extend_from_slice(&[un(r), un(g), un(b), a]);
            }
        }
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let config = RenderConfig {
        surface_size: SurfaceSize::new(WIDTH, HEIGHT),
        ..Default::default()
    };

    let mut view = create_view(&config, Box::new(paint));
    view.created();
    view.expose(Bounds::new(0, 0, WIDTH as i32, HEIGHT as i32));

    let img = view.snapshot().expect("surface snapshot");
    write_png("text_metrics.png", &img).expect("write text_metrics.png");
    println!("wrote text_metrics.png ({}x{})", img.width, img.height);

    view.destroyed();
}
