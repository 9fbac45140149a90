//! Local PDF label renderer
//!
//! Fallback for shipments where the carrier returns no ready-made document:
//! a fixed-size page with the tracking number, a Code128 barcode (machine-
//! and human-readable), the recipient block and an itemized goods list that
//! truncates with an ellipsis once it would run into the barcode zone.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use barcoders::sym::code128::Code128;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Address, LabelDocument};

/// Label rendering errors
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("empty tracking code")]
    EmptyTracking,
    #[error("barcode encoding failed: {0}")]
    Barcode(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("font error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page arrangement of the rendered label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrientation {
    /// 100 x 150 mm thermal label
    Portrait,
    /// 150 x 80 mm wide label
    Landscape,
}

impl Default for LabelOrientation {
    fn default() -> Self {
        LabelOrientation::Portrait
    }
}

/// One goods line printed on the label.
#[derive(Debug, Clone)]
pub struct LabelItem {
    pub name: String,
    pub quantity: f64,
}

/// Everything the renderer needs to draw one label.
#[derive(Debug, Clone)]
pub struct LabelSpec {
    pub tracking_code: String,
    pub recipient: Address,
    /// Shipping-from name: the warehouse when the picking has one, the
    /// owning company otherwise
    pub sender_name: String,
    pub items: Vec<LabelItem>,
    pub orientation: LabelOrientation,
}

/// Page geometry constants, all in millimetres.
struct PageGeometry {
    width: f64,
    height: f64,
    tracking_y: f64,
    recipient_y0: f64,
    recipient_step: f64,
    goods_x: f64,
    goods_y0: f64,
    goods_step: f64,
    /// Items stop (with an "..." marker) once the cursor would drop below
    /// this line, which sits just above the barcode zone
    goods_floor: f64,
    barcode_y: f64,
    barcode_height: f64,
    code_text_y: f64,
}

impl PageGeometry {
    fn for_orientation(orientation: LabelOrientation) -> Self {
        match orientation {
            LabelOrientation::Portrait => PageGeometry {
                width: 100.0,
                height: 150.0,
                tracking_y: 140.0,
                recipient_y0: 128.0,
                recipient_step: 9.0,
                goods_x: 5.0,
                goods_y0: 60.0,
                goods_step: 7.0,
                goods_floor: 45.0,
                barcode_y: 20.0,
                barcode_height: 20.0,
                code_text_y: 14.0,
            },
            LabelOrientation::Landscape => PageGeometry {
                width: 150.0,
                height: 80.0,
                tracking_y: 70.0,
                recipient_y0: 62.0,
                recipient_step: 6.0,
                // Goods go into a right-hand column on the wide layout
                goods_x: 85.0,
                goods_y0: 62.0,
                goods_step: 6.0,
                goods_floor: 30.0,
                barcode_y: 8.0,
                barcode_height: 14.0,
                code_text_y: 3.0,
            },
        }
    }
}

/// Encode a tracking code as Code128 modules (1 = bar, 0 = space).
///
/// Character set B covers the full printable-ASCII range of synthesized
/// tracking codes (uppercase, digits, dashes).
pub fn encode_code128(data: &str) -> Result<Vec<u8>, LabelError> {
    if data.is_empty() {
        return Err(LabelError::EmptyTracking);
    }
    let barcode = Code128::new(format!("\u{0181}{}", data))
        .map_err(|e| LabelError::Barcode(format!("{:?}", e)))?;
    Ok(barcode.encode())
}

/// Format a quantity the way the host system prints it: integers without the
/// trailing `.0`.
fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

/// Compose the goods section: one `"{name} x {qty}"` line per item, cut off
/// with an ellipsis marker when more items exist than fit.
fn goods_lines(items: &[LabelItem], max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if index + 1 >= max_lines && items.len() > max_lines {
            lines.push("...".to_string());
            break;
        }
        lines.push(format!("{} x {}", item.name, format_quantity(item.quantity)));
    }
    lines
}

/// PDF label renderer.
///
/// Takes an optional TTF font path; a font covering the destination script
/// (CJK in the reference deployment) must be configured, or those glyphs
/// silently drop from the built-in Helvetica fallback.
pub struct LabelRenderer {
    font_path: Option<PathBuf>,
}

impl LabelRenderer {
    pub fn new(font_path: Option<PathBuf>) -> Self {
        LabelRenderer { font_path }
    }

    /// Render a label to PDF bytes.
    pub fn render(&self, spec: &LabelSpec) -> Result<LabelDocument, LabelError> {
        if spec.tracking_code.is_empty() {
            return Err(LabelError::EmptyTracking);
        }
        let geometry = PageGeometry::for_orientation(spec.orientation);
        debug!(tracking_code = %spec.tracking_code, "rendering local label");

        let (doc, page, layer) = PdfDocument::new(
            "Shipping Label",
            Mm(geometry.width),
            Mm(geometry.height),
            "label",
        );
        let layer = doc.get_page(page).get_layer(layer);

        let font = self.load_font(&doc)?;

        // Tracking number headline
        layer.use_text(
            format!("Tracking: {}", spec.tracking_code),
            12.0,
            Mm(5.0),
            Mm(geometry.tracking_y),
            &font,
        );

        // Recipient block
        let recipient = &spec.recipient;
        let block = [
            format!("To: {}", recipient.name),
            format!("Tel: {}", recipient.phone.as_deref().unwrap_or("")),
            format!("Country: {}", recipient.country.as_deref().unwrap_or("")),
            format!("Province: {}", recipient.province.as_deref().unwrap_or("")),
            format!("City: {}", recipient.city.as_deref().unwrap_or("")),
            format!("Address: {}", recipient.street.as_deref().unwrap_or("")),
            format!("From: {}", spec.sender_name),
        ];
        let mut y = geometry.recipient_y0;
        for line in &block {
            layer.use_text(line.clone(), 10.0, Mm(5.0), Mm(y), &font);
            y -= geometry.recipient_step;
        }

        // Goods list
        let max_lines =
            ((geometry.goods_y0 - geometry.goods_floor) / geometry.goods_step) as usize + 1;
        let mut y = geometry.goods_y0;
        layer.use_text("Items:", 10.0, Mm(geometry.goods_x), Mm(y + geometry.goods_step), &font);
        for line in goods_lines(&spec.items, max_lines) {
            layer.use_text(line, 9.0, Mm(geometry.goods_x + 3.0), Mm(y), &font);
            y -= geometry.goods_step;
        }

        // Code128 barcode, centered, with the code repeated beneath the bars
        let modules = encode_code128(&spec.tracking_code)?;
        draw_barcode(&layer, &modules, &geometry);
        layer.use_text(
            spec.tracking_code.clone(),
            8.0,
            Mm(geometry.width / 4.0),
            Mm(geometry.code_text_y),
            &font,
        );

        let mut buffer: Vec<u8> = Vec::new();
        doc.save(&mut BufWriter::new(&mut buffer))
            .map_err(|e| LabelError::Pdf(e.to_string()))?;

        Ok(LabelDocument {
            file_name: format!("label_{}.pdf", spec.tracking_code),
            content: buffer,
            mime_type: "application/pdf".to_string(),
        })
    }

    fn load_font(
        &self,
        doc: &printpdf::PdfDocumentReference,
    ) -> Result<IndirectFontRef, LabelError> {
        match &self.font_path {
            Some(path) => {
                let file = File::open(path)?;
                doc.add_external_font(file)
                    .map_err(|e| LabelError::Pdf(e.to_string()))
            }
            None => doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| LabelError::Pdf(e.to_string())),
        }
    }
}

/// Draw the module pattern as filled rectangles, centered horizontally and
/// scaled down when the code would overflow the printable width.
fn draw_barcode(layer: &PdfLayerReference, modules: &[u8], geometry: &PageGeometry) {
    let usable = geometry.width - 10.0;
    let module_width = (0.33_f64).min(usable / modules.len() as f64);
    let total_width = module_width * modules.len() as f64;
    let origin_x = (geometry.width - total_width) / 2.0;

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

    let mut index = 0;
    while index < modules.len() {
        if modules[index] == 1 {
            let run_start = index;
            while index < modules.len() && modules[index] == 1 {
                index += 1;
            }
            let x = origin_x + run_start as f64 * module_width;
            let width = (index - run_start) as f64 * module_width;
            layer.add_shape(bar(x, geometry.barcode_y, width, geometry.barcode_height));
        } else {
            index += 1;
        }
    }
}

fn bar(x: f64, y: f64, width: f64, height: f64) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y + height)), false),
            (Point::new(Mm(x), Mm(y + height)), false),
        ],
        is_closed: true,
        has_fill: true,
        has_stroke: false,
        is_clipping_path: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(items: usize) -> LabelSpec {
        LabelSpec {
            tracking_code: "000002ODOO1S00042-WH-OUT-00017".to_string(),
            recipient: Address {
                name: "Jane Doe".to_string(),
                phone: Some("555-0101".to_string()),
                country: Some("Spain".to_string()),
                province: Some("Madrid".to_string()),
                city: Some("Madrid".to_string()),
                street: Some("Calle Mayor 1".to_string()),
                ..Default::default()
            },
            sender_name: "Main Warehouse".to_string(),
            items: (0..items)
                .map(|i| LabelItem {
                    name: format!("Item {}", i),
                    quantity: 2.0,
                })
                .collect(),
            orientation: LabelOrientation::Portrait,
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = encode_code128("000002ODOO1S00042-WH-OUT-00017").unwrap();
        let b = encode_code128("000002ODOO1S00042-WH-OUT-00017").unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
        // Codes differing in payload differ in modules
        let c = encode_code128("000002ODOO1S00042-WH-OUT-00018").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_encode_rejects_empty() {
        assert!(matches!(encode_code128(""), Err(LabelError::EmptyTracking)));
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(1.5), "1.5");
    }

    #[test]
    fn test_goods_lines_truncate_with_ellipsis() {
        let items: Vec<LabelItem> = (0..10)
            .map(|i| LabelItem {
                name: format!("Item {}", i),
                quantity: 1.0,
            })
            .collect();
        let lines = goods_lines(&items, 4);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.last().unwrap(), "...");
        // Everything fits: no marker
        let lines = goods_lines(&items[..3], 4);
        assert_eq!(lines, vec!["Item 0 x 1", "Item 1 x 1", "Item 2 x 1"]);
    }

    #[test]
    fn test_render_produces_pdf_named_after_tracking_code() {
        let renderer = LabelRenderer::new(None);
        let document = renderer.render(&spec(3)).unwrap();
        assert!(document.content.starts_with(b"%PDF"));
        assert_eq!(document.file_name, "label_000002ODOO1S00042-WH-OUT-00017.pdf");
        assert_eq!(document.mime_type, "application/pdf");
    }

    #[test]
    fn test_render_overflowing_goods_list_still_fits_page() {
        let renderer = LabelRenderer::new(None);
        let document = renderer.render(&spec(40)).unwrap();
        assert!(document.content.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_landscape_variant() {
        let renderer = LabelRenderer::new(None);
        let mut wide = spec(2);
        wide.orientation = LabelOrientation::Landscape;
        assert!(renderer.render(&wide).is_ok());
    }

    #[test]
    fn test_render_refuses_empty_tracking() {
        let renderer = LabelRenderer::new(None);
        let mut empty = spec(1);
        empty.tracking_code = String::new();
        assert!(matches!(renderer.render(&empty), Err(LabelError::EmptyTracking)));
    }
}
