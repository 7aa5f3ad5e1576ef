// storefront/src/services/receipt.rs

//! PDF receipts.
//!
//! Layout and rendering are separate: [`receipt_lines`] turns an order
//! snapshot into plain lines, [`paginate`] splits them over A4 pages and only
//! the final step touches `printpdf`. Files are written to
//! `{receipts_dir}/{orderNumber}.pdf` through a temporary file and a rename,
//! so a reader never sees a half-written receipt and regeneration replaces
//! the previous file.

use crate::errors::{AppError, Result};
use crate::models::OrderDetails;
use crate::repository::{OrderRepository, Store};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MARGIN_MM: f32 = 20.0;
const BOTTOM_MARGIN_MM: f32 = 22.0;
const LEFT_MM: f32 = 20.0;
const QTY_COLUMN_MM: f32 = 118.0;
const UNIT_COLUMN_MM: f32 = 138.0;
const TOTAL_COLUMN_MM: f32 = 168.0;
const MAX_ITEM_NAME_CHARS: usize = 52;

static TABLE_HEADER: ReceiptLine = ReceiptLine::TableHeader;

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptLine {
  Title(String),
  Heading(String),
  Text(String),
  TableHeader,
  Item {
    name: String,
    quantity: String,
    unit_price: String,
    line_total: String,
  },
  Amount {
    label: String,
    value: String,
    emphasis: bool,
  },
  Footer(String),
  Blank,
}

impl ReceiptLine {
  fn height_mm(&self) -> f32 {
    match self {
      ReceiptLine::Title(_) => 12.0,
      ReceiptLine::Heading(_) | ReceiptLine::TableHeader => 8.0,
      ReceiptLine::Blank => 4.0,
      _ => 6.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLocation {
  pub path: PathBuf,
  pub url: String,
}

pub fn format_money(currency: &str, amount: Decimal) -> String {
  format!("{} {:.2}", currency, amount)
}

/// Lays out the receipt for `details` top to bottom.
pub fn receipt_lines(details: &OrderDetails, store_name: &str, currency: &str) -> Vec<ReceiptLine> {
  let order = &details.order;
  let mut lines = vec![
    ReceiptLine::Title(store_name.to_string()),
    ReceiptLine::Heading("Payment Receipt".to_string()),
    ReceiptLine::Blank,
    ReceiptLine::Text(format!("Order number: {}", order.order_number)),
    ReceiptLine::Text(format!("Date: {}", order.created_at.format("%d %b %Y %H:%M UTC"))),
    ReceiptLine::Text(format!("Payment method: {}", order.payment_method.label())),
  ];
  match &details.payment {
    Some(payment) => {
      lines.push(ReceiptLine::Text(format!("Payment code: {}", payment.provider_receipt_code)));
      lines.push(ReceiptLine::Text(format!("Transaction: {}", payment.transaction_id)));
    }
    None => lines.push(ReceiptLine::Text(format!("Payment status: {}", order.payment_status))),
  }

  lines.push(ReceiptLine::Blank);
  lines.push(ReceiptLine::Heading("Customer".to_string()));
  lines.push(ReceiptLine::Text(details.customer.display_name().to_string()));
  lines.push(ReceiptLine::Text(details.customer.email.clone()));
  lines.push(ReceiptLine::Blank);
  lines.push(ReceiptLine::Heading("Ship to".to_string()));
  lines.extend(details.address.lines().into_iter().map(ReceiptLine::Text));

  lines.push(ReceiptLine::Blank);
  lines.push(ReceiptLine::TableHeader);
  for item in &details.items {
    let mut name = item.name.clone();
    let variant: Vec<&str> = [item.size.as_deref(), item.color.as_deref()].into_iter().flatten().collect();
    if !variant.is_empty() {
      name = format!("{} ({})", name, variant.join(", "));
    }
    if name.chars().count() > MAX_ITEM_NAME_CHARS {
      name = name.chars().take(MAX_ITEM_NAME_CHARS - 3).collect::<String>() + "...";
    }
    lines.push(ReceiptLine::Item {
      name,
      quantity: item.quantity.to_string(),
      unit_price: format!("{:.2}", item.unit_price),
      line_total: format!("{:.2}", item.line_total()),
    });
  }

  lines.push(ReceiptLine::Blank);
  for (label, value, emphasis) in [
    ("Subtotal", order.subtotal, false),
    ("Tax", order.tax, false),
    ("Shipping", order.shipping_cost, false),
    ("Total", order.total, true),
  ] {
    lines.push(ReceiptLine::Amount {
      label: label.to_string(),
      value: format_money(currency, value),
      emphasis,
    });
  }

  lines.push(ReceiptLine::Blank);
  lines.push(ReceiptLine::Footer(format!("Thank you for shopping with {}.", store_name)));
  lines.push(ReceiptLine::Footer(
    "This receipt was issued electronically and is valid without a signature.".to_string(),
  ));
  lines
}

/// Splits `lines` into pages that fit between the margins. Every page gets
/// at least one line.
pub fn paginate(lines: &[ReceiptLine]) -> Vec<Vec<&ReceiptLine>> {
  let usable = PAGE_HEIGHT_MM - TOP_MARGIN_MM - BOTTOM_MARGIN_MM;
  let mut pages: Vec<Vec<&ReceiptLine>> = Vec::new();
  let mut current: Vec<&ReceiptLine> = Vec::new();
  let mut used = 0.0;

  for line in lines {
    let height = line.height_mm();
    if !current.is_empty() && used + height > usable {
      pages.push(std::mem::take(&mut current));
      used = 0.0;
      // Items continuing on a new page get their column labels again.
      if matches!(line, ReceiptLine::Item { .. }) {
        current.push(&TABLE_HEADER);
        used += TABLE_HEADER.height_mm();
      }
    }
    current.push(line);
    used += height;
  }
  if !current.is_empty() || pages.is_empty() {
    pages.push(current);
  }
  pages
}

fn draw_line(layer: &PdfLayerReference, line: &ReceiptLine, y: f32, regular: &IndirectFontRef, bold: &IndirectFontRef) {
  match line {
    ReceiptLine::Title(text) => layer.use_text(text.as_str(), 20.0, Mm(LEFT_MM), Mm(y), bold),
    ReceiptLine::Heading(text) => layer.use_text(text.as_str(), 12.0, Mm(LEFT_MM), Mm(y), bold),
    ReceiptLine::Text(text) => layer.use_text(text.as_str(), 10.0, Mm(LEFT_MM), Mm(y), regular),
    ReceiptLine::TableHeader => {
      layer.use_text("Item", 10.0, Mm(LEFT_MM), Mm(y), bold);
      layer.use_text("Qty", 10.0, Mm(QTY_COLUMN_MM), Mm(y), bold);
      layer.use_text("Unit price", 10.0, Mm(UNIT_COLUMN_MM), Mm(y), bold);
      layer.use_text("Total", 10.0, Mm(TOTAL_COLUMN_MM), Mm(y), bold);
    }
    ReceiptLine::Item {
      name,
      quantity,
      unit_price,
      line_total,
    } => {
      layer.use_text(name.as_str(), 10.0, Mm(LEFT_MM), Mm(y), regular);
      layer.use_text(quantity.as_str(), 10.0, Mm(QTY_COLUMN_MM), Mm(y), regular);
      layer.use_text(unit_price.as_str(), 10.0, Mm(UNIT_COLUMN_MM), Mm(y), regular);
      layer.use_text(line_total.as_str(), 10.0, Mm(TOTAL_COLUMN_MM), Mm(y), regular);
    }
    ReceiptLine::Amount { label, value, emphasis } => {
      let font = if *emphasis { bold } else { regular };
      layer.use_text(label.as_str(), 11.0, Mm(UNIT_COLUMN_MM - 20.0), Mm(y), font);
      layer.use_text(value.as_str(), 11.0, Mm(TOTAL_COLUMN_MM - 10.0), Mm(y), font);
    }
    ReceiptLine::Footer(text) => layer.use_text(text.as_str(), 8.0, Mm(LEFT_MM), Mm(y), regular),
    ReceiptLine::Blank => {}
  }
}

fn pdf_err(e: impl std::fmt::Debug) -> AppError {
  AppError::Receipt(format!("PDF rendering failed: {:?}", e))
}

fn render_pdf(title: &str, lines: &[ReceiptLine]) -> Result<Vec<u8>> {
  let pages = paginate(lines);
  let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
  let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
  let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

  for (index, page_lines) in pages.iter().enumerate() {
    let layer = if index == 0 {
      doc.get_page(first_page).get_layer(first_layer)
    } else {
      let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
      doc.get_page(page).get_layer(layer)
    };

    let mut y = PAGE_HEIGHT_MM - TOP_MARGIN_MM;
    for line in page_lines {
      draw_line(&layer, line, y, &regular, &bold);
      y -= line.height_mm();
    }
    layer.use_text(
      format!("Page {} of {}", index + 1, pages.len()),
      8.0,
      Mm(PAGE_WIDTH_MM - 45.0),
      Mm(10.0),
      &regular,
    );
  }

  doc.save_to_bytes().map_err(pdf_err)
}

pub struct ReceiptGenerator {
  store: Arc<dyn Store>,
  receipts_dir: PathBuf,
  base_url: String,
  store_name: String,
  currency: String,
}

impl ReceiptGenerator {
  pub fn new(
    store: Arc<dyn Store>,
    receipts_dir: impl Into<PathBuf>,
    base_url: impl Into<String>,
    store_name: impl Into<String>,
    currency: impl Into<String>,
  ) -> Self {
    Self {
      store,
      receipts_dir: receipts_dir.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      store_name: store_name.into(),
      currency: currency.into(),
    }
  }

  pub fn receipts_dir(&self) -> &Path {
    &self.receipts_dir
  }

  pub fn path_for(&self, order_number: &str) -> PathBuf {
    self.receipts_dir.join(format!("{}.pdf", order_number))
  }

  pub fn url_for(&self, order_number: &str) -> String {
    format!("{}/receipts/{}.pdf", self.base_url, order_number)
  }

  /// Renders the current snapshot of the order and writes it over any
  /// previous receipt for the same order number.
  #[instrument(name = "receipt::generate", skip(self), err(Display))]
  pub async fn generate(&self, order_id: Uuid) -> Result<ReceiptLocation> {
    let details = self
      .store
      .find_details(order_id)
      .await?
      .ok_or_else(|| AppError::not_found("Order", order_id))?;
    let order_number = details.order.order_number.clone();

    let lines = receipt_lines(&details, &self.store_name, &self.currency);
    let title = format!("{} receipt {}", self.store_name, order_number);
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&title, &lines))
      .await
      .map_err(|e| AppError::Internal(format!("Receipt rendering task failed: {}", e)))??;

    tokio::fs::create_dir_all(&self.receipts_dir).await.map_err(|e| {
      AppError::Receipt(format!(
        "Cannot create receipts directory {}: {}",
        self.receipts_dir.display(),
        e
      ))
    })?;

    let path = self.path_for(&order_number);
    let staging = self
      .receipts_dir
      .join(format!(".{}.{}.tmp", order_number, Uuid::new_v4().simple()));
    tokio::fs::write(&staging, &bytes)
      .await
      .map_err(|e| AppError::Receipt(format!("Cannot write {}: {}", staging.display(), e)))?;
    if let Err(e) = tokio::fs::rename(&staging, &path).await {
      let _ = tokio::fs::remove_file(&staging).await;
      return Err(AppError::Receipt(format!("Cannot move receipt into {}: {}", path.display(), e)));
    }

    info!(%order_number, path = %path.display(), bytes = bytes.len(), "Receipt written.");
    Ok(ReceiptLocation {
      url: self.url_for(&order_number),
      path,
    })
  }
}
