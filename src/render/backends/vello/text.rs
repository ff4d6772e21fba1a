//! Text shaping for the Vello backend.
//!
//! Resolves font families through a fontique collection (preferred family,
//! then UI Sans, then SansSerif), shapes runs with Parley, and converts the
//! positioned glyphs into Vello [`Glyph`]s ready to stream into a scene.
//! Metrics come from the same shaped layouts, so measurement and rendering
//! can never disagree.

use anyhow::anyhow;
use fontique::{Attributes, Collection, GenericFamily, QueryFamily, QueryStatus, SourceCache};
use parley::style::{FontFamily, FontStack, FontWeight, StyleProperty};
use parley::{Font as VelloFont, FontContext, Layout, LayoutContext};
use vello::Glyph;

use crate::font::{Font, FontMetrics, TextMetrics};

/// A shaped run ready to draw: resolved font, size, and absolute glyph
/// positions with y already on the first baseline.
pub struct ShapedText {
    pub font: VelloFont,
    pub size: f32,
    pub glyphs: Vec<Glyph>,
}

/// Owns the fontique collection and the Parley shaping contexts for one
/// backend instance. Torn down with the backend; nothing here is process
/// global.
pub struct TextEngine {
    collection: Collection,
    cache: SourceCache,
    font_cx: FontContext,
    layout_cx: LayoutContext<[u8; 4]>,
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            collection: Collection::new(Default::default()),
            cache: SourceCache::new_shared(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Resolve a preferred family name; falls back to UI Sans → SansSerif.
    pub fn resolve_family(&mut self, prefer: Option<&str>) -> anyhow::Result<(VelloFont, String)> {
        let mut col_clone = self.collection.clone();
        let mut q = self.collection.query(&mut self.cache);

        let mut families: Vec<QueryFamily> = Vec::new();
        if let Some(name) = prefer {
            families.push(QueryFamily::Named(name));
        }
        families.push(GenericFamily::UiSansSerif.into());
        families.push(GenericFamily::SansSerif.into());

        q.set_families(families);
        q.set_attributes(Attributes::default());

        let mut chosen: Option<(VelloFont, String)> = None;
        q.matches_with(|cand| {
            let font = VelloFont::new(cand.blob.clone(), cand.index);
            let (fam_id, _) = cand.family;
            match col_clone.family(fam_id) {
                Some(info) => {
                    chosen = Some((font, info.name().to_string()));
                    QueryStatus::Stop
                }
                None => QueryStatus::Continue,
            }
        });

        chosen.ok_or_else(|| anyhow!("no usable font family"))
    }

    fn build_layout(&mut self, text: &str, font: &Font, family_name: &str) -> Layout<[u8; 4]> {
        let px = font.height() as f32;
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, true);
        builder.push_default(StyleProperty::FontSize(px));
        builder.push_default(StyleProperty::FontStack(FontStack::Single(
            FontFamily::Named(family_name.to_string().into()),
        )));
        if font.bold() {
            builder.push_default(StyleProperty::FontWeight(FontWeight::BOLD));
        }
        if font.italic() {
            builder.push_default(StyleProperty::FontStyle(parley::style::FontStyle::Italic));
        }

        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::layout::Alignment::Start,
            parley::layout::AlignmentOptions::default(),
        );
        layout
    }

    /// Shape `text` into glyphs positioned with the first baseline at y 0.
    pub fn shape(&mut self, text: &str, font: &Font, default_family: &str) -> anyhow::Result<Vec<ShapedText>> {
        let prefer = font.family().or(Some(default_family));
        let (vello_font, family_name) = self.resolve_family(prefer)?;

        let layout = self.build_layout(text, font, &family_name);
        let mut runs = Vec::new();

        for line in layout.lines() {
            for item in line.items() {
                if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                    let baseline = run.baseline();
                    let glyphs: Vec<Glyph> = run
                        .positioned_glyphs()
                        .map(|g| Glyph {
                            id: g.id as u32,
                            x: g.x,
                            y: g.y - baseline,
                        })
                        .collect();

                    runs.push(ShapedText {
                        font: vello_font.clone(),
                        size: font.height() as f32,
                        glyphs,
                    });
                }
            }
        }

        Ok(runs)
    }

    /// Measure `text` without drawing it.
    pub fn measure(&mut self, text: &str, font: &Font, default_family: &str) -> TextMetrics {
        if text.is_empty() {
            return TextMetrics::default();
        }

        let prefer = font.family().or(Some(default_family));
        let family_name = match self.resolve_family(prefer) {
            Ok((_, name)) => name,
            Err(e) => {
                log::debug!("TextEngine: font resolution failed: {e}");
                return TextMetrics::default();
            }
        };

        let layout = self.build_layout(text, font, &family_name);
        let ascent = layout
            .lines()
            .next()
            .map(|l| l.metrics().ascent as f64)
            .unwrap_or(0.0);

        TextMetrics {
            width: layout.width() as f64,
            height: layout.height() as f64,
            x_bearing: 0.0,
            y_bearing: -ascent,
            x_advance: layout.full_width() as f64,
            y_advance: 0.0,
        }
    }

    /// Vertical metrics of `font`, read off a shaped probe line.
    pub fn line_metrics(&mut self, font: &Font, default_family: &str) -> FontMetrics {
        let prefer = font.family().or(Some(default_family));
        let family_name = match self.resolve_family(prefer) {
            Ok((_, name)) => name,
            Err(e) => {
                log::debug!("TextEngine: font resolution failed: {e}");
                return FontMetrics::default();
            }
        };

        // A wide glyph plus a descender makes the probe representative.
        let layout = self.build_layout("Mg", font, &family_name);
        let Some(line) = layout.lines().next() else {
            return FontMetrics::default();
        };
        let m = line.metrics();

        FontMetrics {
            ascent: m.ascent as f64,
            descent: m.descent as f64,
            height: (m.ascent + m.descent) as f64,
            max_x_advance: layout.full_width() as f64,
            max_y_advance: (m.ascent + m.descent + m.leading) as f64,
        }
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}
