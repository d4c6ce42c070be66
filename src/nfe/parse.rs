use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use rust_decimal::Decimal;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::NFE_NS;
use crate::core::{BillingPeriod, Clock, Invoice, TustError};

/// Decode one NFe document.
///
/// `ons_code` and `period` are not part of the XML; they identify the
/// transmitter and billing period the document was retrieved for. The clock
/// supplies the issue timestamp when `ide/dhEmi` is absent.
pub fn parse_nfe(
    xml: &[u8],
    ons_code: &str,
    period: BillingPeriod,
    clock: &dyn Clock,
) -> Result<Invoice, TustError> {
    let parsed = ParsedNfe::read(xml)?;
    parsed.into_invoice(ons_code, period, clock)
}

/// Read and decode an NFe file, recording its path on the invoice.
pub fn parse_nfe_file(
    path: impl AsRef<Path>,
    ons_code: &str,
    period: BillingPeriod,
    clock: &dyn Clock,
) -> Result<Invoice, TustError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mut invoice = parse_nfe(&bytes, ons_code, period, clock).map_err(|e| match e {
        TustError::MalformedDocument(msg) => {
            TustError::malformed(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;
    invoice.source_file = Some(path.to_path_buf());
    Ok(invoice)
}

/// Decode every `*.xml` file below `root`, recursively.
///
/// The order of the returned invoices follows directory traversal and is not
/// guaranteed. The first undecodable file aborts the call.
pub fn parse_nfe_directory(
    root: impl AsRef<Path>,
    ons_code: &str,
    period: BillingPeriod,
    clock: &dyn Clock,
) -> Result<Vec<Invoice>, TustError> {
    let root = root.as_ref();
    let mut invoices = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| TustError::Io(e.into()))?;
        if entry.file_type().is_file() && is_xml(entry.path()) {
            invoices.push(parse_nfe_file(entry.path(), ons_code, period, clock)?);
        }
    }
    info!(
        root = %root.display(),
        ons_code,
        invoices = invoices.len(),
        "parsed NFe directory"
    );
    Ok(invoices)
}

pub(crate) fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

/// Parse a monetary amount, accepting `1234.56` and `1.234,56`.
///
/// When a comma is present it is the decimal separator and dots are
/// thousands separators.
pub fn parse_amount(text: &str) -> Result<Decimal, TustError> {
    let trimmed = text.trim();
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    Decimal::from_str(&normalized)
        .map_err(|e| TustError::malformed(format!("invalid amount '{trimmed}': {e}")))
}

/// Parse an ISO-8601 timestamp; a trailing `Z` is read as `+00:00` and a
/// timestamp without offset is taken as UTC.
pub fn parse_issue_datetime(text: &str) -> Result<DateTime<FixedOffset>, TustError> {
    let trimmed = text.trim();
    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(base) => format!("{base}+00:00"),
        None => trimmed.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized)
        .or_else(|_| DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z"))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map_err(|e| TustError::malformed(format!("invalid timestamp '{trimmed}': {e}")))
}

/// Raw values collected from the document, before typing.
///
/// Every field keeps the first occurrence found in document order.
#[derive(Default, Debug)]
struct ParsedNfe {
    found_info: bool,
    key: Option<String>,
    number: Option<String>,
    series: Option<String>,
    issued_at: Option<String>,
    issuer_cnpj: Option<String>,
    issuer_name: Option<String>,
    recipient_cnpj: Option<String>,
    recipient_name: Option<String>,
    total: Option<String>,
    bill_number: Option<String>,
    installment_number: Option<String>,
    installment_amount: Option<String>,
    due_date: Option<String>,
}

fn is_nfe_ns(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == NFE_NS.as_bytes())
}

fn xml_err(e: impl std::fmt::Display) -> TustError {
    TustError::malformed(format!("XML parse error: {e}"))
}

impl ParsedNfe {
    fn read(xml: &[u8]) -> Result<Self, TustError> {
        let mut reader = NsReader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut parsed = Self::default();
        // Local names of open elements; elements outside the NFe namespace are
        // recorded as empty so they never match.
        let mut path: Vec<String> = Vec::new();
        let mut text = String::new();

        loop {
            match reader.read_resolved_event_into(&mut buf) {
                Ok((ns, Event::Start(e))) => {
                    let name = if is_nfe_ns(&ns) {
                        String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
                    } else {
                        String::new()
                    };
                    path.push(name);
                    if parsed.at_info_element(&path) {
                        parsed.open_info(&e)?;
                    }
                    text.clear();
                }
                Ok((ns, Event::Empty(e))) => {
                    if is_nfe_ns(&ns) && e.local_name().as_ref() == b"infNFe" {
                        path.push("infNFe".into());
                        if parsed.at_info_element(&path) {
                            parsed.open_info(&e)?;
                        }
                        path.pop();
                    }
                }
                Ok((_, Event::Text(e))) => {
                    text.push_str(&e.unescape().map_err(xml_err)?);
                }
                Ok((_, Event::CData(e))) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok((_, Event::End(_))) => {
                    let value = text.trim();
                    if !value.is_empty() {
                        parsed.handle_text(&path, value);
                    }
                    text.clear();
                    path.pop();
                }
                Ok((_, Event::Eof)) => {
                    if !path.is_empty() {
                        return Err(TustError::malformed(format!(
                            "unexpected end of document, {} element(s) still open",
                            path.len()
                        )));
                    }
                    break;
                }
                Err(e) => return Err(xml_err(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(parsed)
    }

    /// True when the innermost element is the first `NFe/infNFe` seen.
    fn at_info_element(&self, path: &[String]) -> bool {
        !self.found_info
            && matches!(path, [.., parent, leaf] if parent == "NFe" && leaf == "infNFe")
    }

    fn open_info(&mut self, e: &BytesStart<'_>) -> Result<(), TustError> {
        self.found_info = true;
        for attr in e.attributes() {
            let attr = attr.map_err(xml_err)?;
            if attr.key.as_ref() == b"Id" {
                self.key = Some(attr.unescape_value().map_err(xml_err)?.trim().to_string());
            }
        }
        Ok(())
    }

    fn handle_text(&mut self, path: &[String], text: &str) {
        let Some(start) = info_start(path) else {
            return;
        };
        let relative: Vec<&str> = path[start..].iter().map(String::as_str).collect();
        let slot = match relative.as_slice() {
            ["ide", "nNF"] => &mut self.number,
            ["ide", "serie"] => &mut self.series,
            ["ide", "dhEmi"] => &mut self.issued_at,
            ["emit", "CNPJ"] => &mut self.issuer_cnpj,
            ["emit", "xNome"] => &mut self.issuer_name,
            ["dest", "CNPJ"] => &mut self.recipient_cnpj,
            ["dest", "xNome"] => &mut self.recipient_name,
            ["total", "ICMSTot", "vNF"] => &mut self.total,
            ["cobr", "fat", "nFat"] => &mut self.bill_number,
            ["cobr", "dup", "nDup"] => &mut self.installment_number,
            ["cobr", "dup", "vDup"] => &mut self.installment_amount,
            ["cobr", "dup", "dVenc"] => &mut self.due_date,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fn into_invoice(
        self,
        ons_code: &str,
        period: BillingPeriod,
        clock: &dyn Clock,
    ) -> Result<Invoice, TustError> {
        if !self.found_info {
            return Err(TustError::malformed("document has no NFe/infNFe element"));
        }
        let invoice_key = self
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TustError::malformed("infNFe has no Id attribute"))?;

        let issue_datetime = match self.issued_at.as_deref() {
            Some(text) => parse_issue_datetime(text)?,
            None => {
                debug!(invoice_key = %invoice_key, "dhEmi absent, using current time");
                clock.now().fixed_offset()
            }
        };

        let total_amount = match self.total.as_deref() {
            Some(text) => parse_amount(text)?,
            None => Decimal::ZERO,
        };
        let installment_amount = self.installment_amount.as_deref().map(parse_amount).transpose()?;
        let due_date = self
            .due_date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|e| TustError::malformed(format!("invalid due date '{d}': {e}")))
            })
            .transpose()?;

        Ok(Invoice {
            ons_code: ons_code.to_string(),
            billing_period: period,
            issuer_cnpj: self.issuer_cnpj.unwrap_or_default(),
            issuer_name: self.issuer_name.unwrap_or_default(),
            recipient_cnpj: self.recipient_cnpj.unwrap_or_default(),
            recipient_name: self.recipient_name.unwrap_or_default(),
            invoice_number: self.number.unwrap_or_default(),
            series: self.series.unwrap_or_default(),
            invoice_key,
            bill_number: self.bill_number,
            total_amount,
            issue_datetime,
            due_date,
            installment_number: self.installment_number,
            installment_amount,
            source_file: None,
        })
    }
}

/// Index just past the first `NFe/infNFe` pair in `path`.
fn info_start(path: &[String]) -> Option<usize> {
    path.windows(2)
        .position(|w| w[0] == "NFe" && w[1] == "infNFe")
        .map(|i| i + 2)
}
