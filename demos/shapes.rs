//! Headless shapes demo: renders a filled circle, a stroked circle, a
//! rectangle and a triangle into a cairo surface and writes the result to
//! `shapes.png`.
//!
//! Run with: `cargo run --example shapes --features backend_cairo`

use std::fs::File;
use std::io::BufWriter;

use lumen::render::backends::cairo::create_view;
use lumen::render::surface::{RgbaImage, SurfaceSize};
use lumen::render::view::View;
use lumen::{Bounds, Graphics, Path, Rectangle, RenderConfig};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

fn paint(g: &mut Graphics<'_>) {
    // background
    g.set_color(0xff16161du32);
    g.fill_rect(Rectangle::new(0.0, 0.0, WIDTH as f64, HEIGHT as f64));

    let center_y = HEIGHT as f64 / 2.0;
    let shape_size = 100.0;
    let spacing = 150.0;
    let start_x = 100.0;

    // White filled circle
    g.set_color(0xffffffffu32);
    let mut circle_fill = Path::new();
    circle_fill.add_ellipse(start_x, center_y - shape_size / 2.0, shape_size, shape_size);
    g.fill_path(&circle_fill);

    // Red circle stroke
    g.set_color(0xffff0000u32);
    g.context().set_line_width(3.0);
    let mut circle_stroke = Path::new();
    circle_stroke.add_ellipse(start_x, center_y - shape_size / 2.0, shape_size, shape_size);
    g.stroke_path(&circle_stroke);

    // Green rectangle
    g.set_color(0xff00ff00u32);
    g.fill_rect(Rectangle::new(
        start_x + spacing,
        center_y - shape_size / 2.0,
        shape_size,
        shape_size,
    ));

    // Cyan triangle
    g.set_color(0xff00ffffu32);
    let tri_x = start_x + spacing * 2.0 + shape_size / 2.0;
    let tri_y = center_y;
    let tri_h = shape_size * 0.866;
    let mut triangle = Path::new();
    triangle.move_to(tri_x, tri_y - tri_h / 2.0);
    triangle.line_to(tri_x + shape_size / 2.0, tri_y + tri_h / 2.0);
    triangle.line_to(tri_x - shape_size / 2.0, tri_y + tri_h / 2.0);
    triangle.close_path();
    g.fill_path(&triangle);
}

fn write_png(path: &str, img: &RgbaImage) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), img.width, img.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    // Premultiplied BGRA words out of cairo, straight RGBA into the PNG.
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
    write_png("shapes.png", &img).expect("write shapes.png");
    println!("wrote shapes.png ({}x{})", img.width, img.height);

    view.destroyed();
}
