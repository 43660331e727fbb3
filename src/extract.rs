//! Structured-record extraction from the approval detail document.
//!
//! The detail endpoint returns a loosely structured HTML fragment. This
//! module is the one pure stage of the pipeline: no I/O, no session
//! awareness, and total over arbitrary input — malformed documents degrade
//! field-by-field to empty strings or sentinels, never to an error.
//!
//! Extraction works by regex and string scanning rather than a DOM. The
//! contract is the lookup ladder, not the query mechanism:
//!
//! - fields are found by label proximity: the first `<label>` whose text
//!   contains the target phrase, then the first input/textarea before the
//!   next label;
//! - the tracking number falls back label → alternate label → body-text
//!   regex → the `"-"` sentinel;
//! - the external identifier embedded in the approval-trigger button
//!   overrides the identifier the caller resolved earlier, because the
//!   document is the source of truth at submission time.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Sentinel meaning "tracking number extraction failed", as distinct from a
/// legitimately empty field. Displayed as-is downstream.
pub const TRACKING_UNKNOWN: &str = "-";

/// Sentinel for a history entry whose note lookup failed.
pub const NOTE_MISSING: &str = " - ";

/// Caption used for image cards without a header.
pub const DEFAULT_CAPTION: &str = "Dokumentasi";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct School {
    pub npsn: String,
    pub name: String,
    pub address: String,
    pub district: String,
    pub regency: String,
    pub province: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub serial_number: String,
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub source: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: String,
    pub status: String,
    pub user: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub school: School,
    pub item: Item,
    pub images: Vec<ImageRef>,
    pub history: Vec<HistoryEntry>,
    pub external_id: String,
    pub tracking_number: String,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Whether the tracking-number body scan matches case-insensitively.
    pub tracking_case_insensitive: bool,
}

impl Default for ExtractOptions {
    fn default() -> ExtractOptions {
        ExtractOptions {
            tracking_case_insensitive: true,
        }
    }
}

/// Extract a record with default options.
pub fn extract(document: &str, resolved_id: &str) -> ExtractedRecord {
    extract_with(document, resolved_id, &ExtractOptions::default())
}

pub fn extract_with(
    document: &str,
    resolved_id: &str,
    options: &ExtractOptions,
) -> ExtractedRecord {
    let school = School {
        npsn: value_by_label(document, "NPSN"),
        name: value_by_label(document, "Nama Sekolah"),
        address: value_by_label(document, "Alamat"),
        district: value_by_label(document, "Kecamatan"),
        regency: value_by_label(document, "Kabupaten"),
        province: value_by_label(document, "Provinsi"),
    };
    let item = Item {
        serial_number: value_by_label(document, "Serial Number"),
        item_name: value_by_label(document, "Nama Barang"),
    };
    ExtractedRecord {
        school,
        item,
        images: extract_images(document),
        history: extract_history(document),
        external_id: embedded_id(document).unwrap_or_else(|| resolved_id.to_string()),
        tracking_number: tracking_number(document, options),
    }
}

/// Fallback ladder: exact label "No. Resi", exact label "No Resi", body-text
/// regex scan, then the `"-"` sentinel.
fn tracking_number(document: &str, options: &ExtractOptions) -> String {
    let mut tracking = value_by_label(document, "No. Resi");
    if tracking.is_empty() {
        tracking = value_by_label(document, "No Resi");
    }
    if tracking.is_empty() {
        let body = strip_tags(document);
        let re = RegexBuilder::new(r"No\.?\s*Resi\s*[:\n]?\s*([A-Z0-9]+)")
            .case_insensitive(options.tracking_case_insensitive)
            .build()
            .expect("tracking regex");
        if let Some(caps) = re.captures(&body) {
            tracking = caps[1].to_string();
        }
    }
    if tracking.is_empty() {
        tracking = TRACKING_UNKNOWN.to_string();
    }
    tracking
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<label[^>]*>(.*?)</label>").expect("label regex"))
}

/// Label-proximity lookup: the value of the first input/textarea between the
/// matching label and the next label. Missing label or control reads as "".
fn value_by_label(document: &str, phrase: &str) -> String {
    let labels: Vec<(usize, usize, String)> = label_re()
        .captures_iter(document)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some((
                whole.start(),
                whole.end(),
                strip_tags(inner.as_str()).trim().to_string(),
            ))
        })
        .collect();

    for (index, (_, end, text)) in labels.iter().enumerate() {
        if !text.contains(phrase) {
            continue;
        }
        let window_end = labels
            .get(index + 1)
            .map(|(start, _, _)| *start)
            .unwrap_or(document.len());
        return control_value(&document[*end..window_end]);
    }
    String::new()
}

/// Value of the first input or textarea in the window, whichever comes first.
fn control_value(window: &str) -> String {
    static INPUT_RE: OnceLock<Regex> = OnceLock::new();
    static TEXTAREA_RE: OnceLock<Regex> = OnceLock::new();
    let input_re =
        INPUT_RE.get_or_init(|| Regex::new(r"(?is)<input[^>]*>").expect("input regex"));
    let textarea_re = TEXTAREA_RE
        .get_or_init(|| Regex::new(r"(?is)<textarea[^>]*>(.*?)</textarea>").expect("textarea regex"));

    let input = input_re.find(window);
    let textarea = textarea_re.captures(window);
    let textarea_start = textarea
        .as_ref()
        .and_then(|caps| caps.get(0))
        .map(|m| m.start());

    match (input, textarea_start) {
        (Some(tag), Some(ta_start)) if ta_start < tag.start() => textarea_text(&textarea),
        (Some(tag), _) => attr_value(tag.as_str(), "value").unwrap_or_default(),
        (None, Some(_)) => textarea_text(&textarea),
        (None, None) => String::new(),
    }
}

fn textarea_text(captures: &Option<regex::Captures<'_>>) -> String {
    captures
        .as_ref()
        .and_then(|caps| caps.get(1))
        .map(|m| strip_tags(m.as_str()).trim().to_string())
        .unwrap_or_default()
}

/// The approval-trigger button carries the submission identifier in its
/// `data-id` attribute.
fn embedded_id(document: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?is)<button[^>]*onclick\s*=\s*"[^"]*approvalFunc[^"]*"[^>]*>"#)
            .expect("approval button regex")
    });
    let tag = re.find(document)?;
    attr_value(tag.as_str(), "data-id").filter(|id| !id.is_empty())
}

/// Each `col-6` card block with an image yields one entry; the card header
/// text captions it.
fn extract_images(document: &str) -> Vec<ImageRef> {
    static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
    static IMG_RE: OnceLock<Regex> = OnceLock::new();
    let block_re = BLOCK_RE.get_or_init(|| {
        Regex::new(r#"(?is)<div[^>]*class\s*=\s*"[^"]*col-6[^"]*"[^>]*>"#)
            .expect("image block regex")
    });
    let img_re = IMG_RE.get_or_init(|| Regex::new(r"(?is)<img[^>]*>").expect("img regex"));

    let starts: Vec<usize> = block_re.find_iter(document).map(|m| m.start()).collect();
    let mut images = Vec::new();
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(document.len());
        let chunk = &document[start..end];
        let Some(img) = img_re.find(chunk) else {
            continue;
        };
        let caption = class_text(chunk, "card-header")
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_CAPTION.to_string());
        images.push(ImageRef {
            source: attr_value(img.as_str(), "src").unwrap_or_default(),
            caption,
        });
    }
    images
}

/// History entries live in `border rounded` blocks inside the approval-log
/// accordion. Every sub-field is independently optional.
fn extract_history(document: &str) -> Vec<HistoryEntry> {
    static BODY_RE: OnceLock<Regex> = OnceLock::new();
    static ENTRY_RE: OnceLock<Regex> = OnceLock::new();
    let body_re = BODY_RE.get_or_init(|| {
        Regex::new(r#"(?is)<div[^>]*class\s*=\s*"[^"]*accordion-body[^"]*"[^>]*>"#)
            .expect("accordion regex")
    });
    let entry_re = ENTRY_RE.get_or_init(|| {
        Regex::new(r#"(?is)<div[^>]*class\s*=\s*"[^"]*border[^"]*rounded[^"]*"[^>]*>"#)
            .expect("log entry regex")
    });

    let Some(log_at) = document.find("logApproval") else {
        return Vec::new();
    };
    let after_log = &document[log_at..];
    let Some(body) = body_re.find(after_log) else {
        return Vec::new();
    };
    let container = &after_log[body.end()..];

    let starts: Vec<usize> = entry_re.find_iter(container).map(|m| m.start()).collect();
    let mut entries = Vec::new();
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(container.len());
        let chunk = &container[start..end];
        entries.push(HistoryEntry {
            date: class_text(chunk, "text-muted").unwrap_or_default(),
            status: class_text(chunk, "fw-bold").unwrap_or_default(),
            user: class_text(chunk, "fw-semibold")
                .map(|text| text.replace("User:", "").trim().to_string())
                .unwrap_or_default(),
            note: note_after_marker(chunk).unwrap_or_else(|| NOTE_MISSING.to_string()),
        });
    }
    entries
}

/// The note text lives in the element immediately following the `mt-2 small`
/// marker. Any miss along the way means the note is unavailable.
fn note_after_marker(chunk: &str) -> Option<String> {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    static OPEN_RE: OnceLock<Regex> = OnceLock::new();
    let marker_re = MARKER_RE.get_or_init(|| {
        Regex::new(r#"(?is)<[a-z][a-z0-9]*[^>]*class\s*=\s*"[^"]*mt-2[^"]*small[^"]*"[^>]*>"#)
            .expect("note marker regex")
    });
    let open_re =
        OPEN_RE.get_or_init(|| Regex::new(r"(?is)<[a-z][a-z0-9]*[^>]*>").expect("open tag regex"));

    let marker = marker_re.find(chunk)?;
    let after_marker = &chunk[marker.end()..];
    // Skip past the marker element's closing tag to reach its sibling.
    let close_at = after_marker.find("</")?;
    let close_end = after_marker[close_at..].find('>')? + close_at + 1;
    let siblings = &after_marker[close_end..];

    let next = open_re.find(siblings)?;
    let inner_end = siblings[next.end()..].find("</")? + next.end();
    let text = strip_tags(&siblings[next.end()..inner_end])
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Trimmed text content of the first element carrying the given class.
fn class_text(chunk: &str, class: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r#"(?is)<[a-z][a-z0-9]*[^>]*class\s*=\s*"[^"]*{}[^"]*"[^>]*>"#,
        regex::escape(class)
    ))
    .expect("class regex");
    let open = re.find(chunk)?;
    let rest = &chunk[open.end()..];
    let end = rest.find("</")?;
    Some(strip_tags(&rest[..end]).trim().to_string())
}

fn attr_value(tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r#"(?is){}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    ))
    .expect("attr regex");
    let caps = re.captures(tag)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn strip_tags(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
    let text = tag_re.replace_all(html, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_field(label: &str, value: &str) -> String {
        format!(r#"<div><label>{label}</label><input type="text" value="{value}"></div>"#)
    }

    #[test]
    fn value_by_label_reads_nearest_input() {
        let doc = format!(
            "{}{}",
            labeled_field("NPSN", "12345678"),
            labeled_field("Nama Sekolah", "SDN 1 Contoh")
        );
        assert_eq!(value_by_label(&doc, "NPSN"), "12345678");
        assert_eq!(value_by_label(&doc, "Nama Sekolah"), "SDN 1 Contoh");
    }

    #[test]
    fn value_by_label_reads_textarea() {
        let doc = "<div><label>Alamat</label><textarea> Jl. Merdeka 1 </textarea></div>";
        assert_eq!(value_by_label(doc, "Alamat"), "Jl. Merdeka 1");
    }

    #[test]
    fn missing_label_reads_empty() {
        assert_eq!(value_by_label("<p>nothing here</p>", "NPSN"), "");
    }

    #[test]
    fn control_after_next_label_is_out_of_reach() {
        let doc = r#"<label>NPSN</label><label>Other</label><input value="x">"#;
        assert_eq!(value_by_label(doc, "NPSN"), "");
    }

    #[test]
    fn tracking_tier_one_exact_label() {
        let doc = labeled_field("No. Resi", "AB123");
        let record = extract(&doc, "");
        assert_eq!(record.tracking_number, "AB123");
    }

    #[test]
    fn tracking_tier_two_alternate_label() {
        let doc = labeled_field("No Resi", "CD456");
        let record = extract(&doc, "");
        assert_eq!(record.tracking_number, "CD456");
    }

    #[test]
    fn tracking_tier_three_body_scan() {
        let doc = "<p>Pengiriman</p><p>No Resi: EF789</p>";
        let record = extract(doc, "");
        assert_eq!(record.tracking_number, "EF789");
    }

    #[test]
    fn tracking_tier_four_sentinel() {
        let record = extract("<p>no shipping info at all</p>", "");
        assert_eq!(record.tracking_number, TRACKING_UNKNOWN);
    }

    #[test]
    fn tracking_scan_case_sensitivity_is_configurable() {
        let doc = "<p>no resi: gh012</p>";
        let insensitive = extract_with(
            doc,
            "",
            &ExtractOptions {
                tracking_case_insensitive: true,
            },
        );
        assert_eq!(insensitive.tracking_number, "gh012");
        let sensitive = extract_with(
            doc,
            "",
            &ExtractOptions {
                tracking_case_insensitive: false,
            },
        );
        assert_eq!(sensitive.tracking_number, TRACKING_UNKNOWN);
    }

    #[test]
    fn embedded_id_overrides_resolved_id() {
        let doc = r#"<button data-id="doc-77" onclick="approvalFunc(this)">Approve</button>"#;
        let record = extract(doc, "resolved-1");
        assert_eq!(record.external_id, "doc-77");
    }

    #[test]
    fn resolved_id_survives_when_document_has_none() {
        let record = extract("<p>plain</p>", "resolved-1");
        assert_eq!(record.external_id, "resolved-1");
    }

    #[test]
    fn image_cards_use_header_caption_with_default() {
        let doc = concat!(
            r#"<div class="card"><div class="card-body">"#,
            r#"<div class="col-6"><div class="card-header">Foto Sekolah</div><img src="/a.jpg"></div>"#,
            r#"<div class="col-6"><img src="/b.jpg"></div>"#,
            r#"<div class="col-6"><p>no image here</p></div>"#,
            r#"</div></div>"#,
        );
        let record = extract(doc, "");
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[0].caption, "Foto Sekolah");
        assert_eq!(record.images[0].source, "/a.jpg");
        assert_eq!(record.images[1].caption, DEFAULT_CAPTION);
        assert_eq!(record.images[1].source, "/b.jpg");
    }

    #[test]
    fn history_entries_extract_sub_fields() {
        let doc = concat!(
            r#"<div id="logApproval"><div class="accordion-body">"#,
            r#"<div class="border rounded">"#,
            r#"<span class="text-muted">2024-01-02</span>"#,
            r#"<span class="fw-bold">Ditolak</span>"#,
            r#"<span class="fw-semibold">User: Sari</span>"#,
            r#"<div class="mt-2 small">Catatan</div><p>BAPP tidak jelas</p>"#,
            r#"</div>"#,
            r#"<div class="border rounded"><span class="fw-bold">Diterima</span></div>"#,
            r#"</div></div>"#,
        );
        let record = extract(doc, "");
        assert_eq!(record.history.len(), 2);
        let first = &record.history[0];
        assert_eq!(first.date, "2024-01-02");
        assert_eq!(first.status, "Ditolak");
        assert_eq!(first.user, "Sari");
        assert_eq!(first.note, "BAPP tidak jelas");
        let second = &record.history[1];
        assert_eq!(second.date, "");
        assert_eq!(second.status, "Diterima");
        assert_eq!(second.user, "");
        assert_eq!(second.note, NOTE_MISSING);
    }

    #[test]
    fn extractor_is_total_over_garbage() {
        for doc in ["", "<<<<>>>", "not html at all", "<label>NPSN</label"] {
            let record = extract(doc, "seed");
            assert_eq!(record.external_id, "seed");
            assert_eq!(record.tracking_number, TRACKING_UNKNOWN);
            assert!(record.images.is_empty());
            assert!(record.history.is_empty());
            assert_eq!(record.school, School::default());
            assert_eq!(record.item, Item::default());
        }
    }
}
