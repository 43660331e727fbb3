//! The evaluation form and its decision rule.
//!
//! Eleven fixed categories, each bound to a sheet column. The first option
//! of every category is the compliant default; the accept/reject decision is
//! derived entirely from whether the form still equals its defaults. Every
//! non-default selection with a canonical reason contributes one line to the
//! rejection note, in category declaration order.

use std::collections::BTreeMap;

/// Column letter → selected option.
pub type EvaluationForm = BTreeMap<String, String>;

/// Rejection note when no non-default selection maps to a canonical reason.
pub const REJECTION_FALLBACK: &str = "Ditolak";

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Sheet column the category writes back to.
    pub column: &'static str,
    pub label: &'static str,
    /// First option is the compliant default.
    pub options: &'static [&'static str],
}

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        column: "G",
        label: "GEO TAGGING",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada"],
    },
    FieldSpec {
        column: "H",
        label: "FOTO SEKOLAH/PAPAN NAMA",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak Terlihat Jelas"],
    },
    FieldSpec {
        column: "I",
        label: "FOTO BOX & PIC",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada"],
    },
    FieldSpec {
        column: "J",
        label: "FOTO KELENGKAPAN UNIT",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada"],
    },
    FieldSpec {
        column: "K",
        label: "DXDIAG",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak terlihat jelas"],
    },
    FieldSpec {
        column: "L",
        label: "FOTO SN UNIT",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada"],
    },
    FieldSpec {
        column: "O",
        label: "BARCODE SN BAPP",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak Terlihat Jelas"],
    },
    FieldSpec {
        column: "Q",
        label: "BAPP HAL 1",
        options: &[
            "Lengkap",
            "Tidak Lengkap",
            "Tidak Sesuai/Rusak/Tidak Ada",
            "BAPP Tidak Jelas",
            "Diedit",
            "Tidak Ada",
            "Ceklis tidak lengkap",
            "Data tidak lengkap",
            "Double ceklis",
            "Data BAPP sekolah tidak sesuai",
            "BAPP terpotong",
        ],
    },
    FieldSpec {
        column: "R",
        label: "BAPP HAL 2",
        options: &[
            "Lengkap",
            "Tidak Lengkap",
            "Ceklis Belum Dapat Diterima",
            "BAPP Tidak Jelas",
            "Diedit",
            "Tidak Ada",
            "Tanggal Tidak Ada",
            "Tanggal Tidak Konsisten",
            "Tidak Ada Paraf",
            "Ceklis Tidak Lengkap",
            "Double Ceklis",
            "Ceklis tidak sesuai/tidak ada",
            "BAPP terpotong",
        ],
    },
    FieldSpec {
        column: "S",
        label: "TTD BAPP",
        options: &[
            "Konsisten",
            "Tidak Konsisten",
            "TTD Tidak Ada",
            "Tidak ada nama terang pada bagian tanda tangan",
        ],
    },
    FieldSpec {
        column: "T",
        label: "STEMPEL",
        options: &["Sesuai", "Tidak Sesuai", "Tidak Ada", "Tidak Terlihat"],
    },
];

/// Canonical coded reason for one non-default (column, option) pair.
pub fn reason_for(column: &str, option: &str) -> Option<&'static str> {
    Some(match (column, option) {
        ("G", "Tidak Sesuai") => "(5A) Geo Tagging tidak sesuai",
        ("G", "Tidak Ada") => "(5B) Geo Tagging tidak ada",
        ("H", "Tidak Sesuai") => "(4A) Foto sekolah tidak sesuai",
        ("H", "Tidak Ada") => "(4B) Foto sekolah tidak ada",
        ("H", "Tidak Terlihat Jelas") => "(4E) Foto sekolah tidak terlihat jelas",
        ("I", "Tidak Sesuai") => "(4C) Foto Box dan PIC tidak sesuai",
        ("I", "Tidak Ada") => "(4D) Foto Box dan PIC tidak ada",
        ("J", "Tidak Sesuai") => "(2B) Foto kelengkapan Laptop tidak sesuai",
        ("J", "Tidak Ada") => "(2A) Foto kelengkapan Laptop tidak ada",
        ("K", "Tidak Sesuai") => "(6A) DxDiag tidak sesuai",
        ("K", "Tidak Ada") => "(6B) DxDiag tidak ada",
        ("K", "Tidak terlihat jelas") => "(6C) DxDiag tidak terlihat jelas",
        ("L", "Tidak Sesuai") => "(3A) Foto SN unit tidak sesuai",
        ("L", "Tidak Ada") => "(3B) Foto SN unit tidak ada",
        ("O", "Tidak Sesuai") => "(1AI) Barcode SN pada BAPP tidak sesuai dengan data web DAC",
        ("O", "Tidak Ada") => "(1AF) Barcode SN pada BAPP tidak ada",
        ("O", "Tidak Terlihat Jelas") => "(1AG) Barcode SN pada BAPP tidak terlihat jelas",
        ("Q", "Tidak Lengkap") => "(1D) Ceklis BAPP tidak lengkap pada halaman 1",
        ("Q", "Tidak Sesuai/Rusak/Tidak Ada") => {
            "(1Q) Ceklis BAPP tidak sesuai/rusak/tidak ada pada halaman 1"
        }
        ("Q", "BAPP Tidak Jelas") => "(1L) BAPP Halaman 1 tidak terlihat jelas",
        ("Q", "Diedit") => "(1S) BAPP Hal 1 tidak boleh diedit digital",
        ("Q", "Tidak Ada") => "(1W) BAPP Hal 1 tidak ada",
        ("Q", "Ceklis tidak lengkap") => "(1D) Ceklis BAPP tidak lengkap pada halaman 1",
        ("Q", "Data tidak lengkap") => "(1N) Data BAPP halaman 1 tidak lengkap",
        ("Q", "Double ceklis") => "(1I) Double ceklis pada halaman 1 BAPP",
        ("Q", "Data BAPP sekolah tidak sesuai") => {
            "(1K) Data BAPP sekolah tidak sesuai (cek NPSN pada tabel pertama dan NPSN \
             dengan foto sekolah atau NPSN yang diinput)"
        }
        ("Q", "BAPP terpotong") => "(1AL) BAPP Halaman 1 terpotong",
        ("R", "Tidak Lengkap") => "(1E) Ceklis BAPP tidak lengkap pada halaman 2",
        ("R", "Ceklis Belum Dapat Diterima") => "(1Y) Ceklis Belum Dapat Diterima",
        ("R", "BAPP Tidak Jelas") => "(1M) BAPP Halaman 2 tidak terlihat jelas",
        ("R", "Diedit") => "(1T) BAPP Hal 2 tidak boleh diedit digital",
        ("R", "Tidak Ada") => "(1X) BAPP Hal 2 tidak ada",
        ("R", "Tanggal Tidak Ada") => "(1F) Tanggal pada BAPP hal 2 tidak ada",
        ("R", "Tanggal Tidak Konsisten") => "(1Z) Tanggal pada BAPP hal 2 tidak konsisten",
        ("R", "Tidak Ada Paraf") => "(1B) Simpulan BAPP pada hal 2 belum diparaf",
        ("R", "Ceklis Tidak Lengkap") => "(1E) Ceklis BAPP tidak lengkap pada halaman 2",
        ("R", "Double Ceklis") => "(1AK) Double ceklis pada halaman 2 BAPP",
        ("R", "Ceklis tidak sesuai/tidak ada") => {
            "(1AJ) Ceklis BAPP hal 2, terdapat ceklis TIDAK SESUAI/TIDAK ADA"
        }
        ("R", "BAPP terpotong") => "(1AM) BAPP Halaman 2 terpotong",
        ("S", "Tidak Konsisten") => {
            "(1H) Data penanda tangan pada halaman 1 dan halaman 2 BAPP tidak konsisten"
        }
        ("S", "TTD Tidak Ada") => "(1G) Tidak ada tanda tangan dari pihak sekolah atau pihak kedua",
        ("S", "Tidak ada nama terang pada bagian tanda tangan") => {
            "(1AH) Tidak ada nama terang pada bagian tanda tangan"
        }
        ("T", "Tidak Sesuai") => "(1O) Stempel pada BAPP halaman 2 tidak sesuai dengan sekolahnya",
        ("T", "Tidak Ada") => "(1P) Stempel tidak ada",
        ("T", "Tidak Terlihat") => "(1AD) Stempel tidak terlihat",
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionCode {
    Accept,
    Reject,
}

impl DecisionCode {
    /// Wire value the approval system expects: 2 = accept, 3 = reject.
    pub fn wire_value(self) -> u8 {
        match self {
            DecisionCode::Accept => 2,
            DecisionCode::Reject => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub code: DecisionCode,
    pub note: String,
}

/// Every category set to its compliant default.
pub fn default_form() -> EvaluationForm {
    FIELDS
        .iter()
        .map(|field| (field.column.to_string(), field.options[0].to_string()))
        .collect()
}

/// Derive the decision from the form.
///
/// Accept (empty note) iff every category equals its default; otherwise
/// reject with the mapped reasons newline-joined in declaration order. A
/// missing key counts as the default.
pub fn decide(form: &EvaluationForm) -> Decision {
    let mut reasons: Vec<&str> = Vec::new();
    let mut all_default = true;
    for field in FIELDS {
        let selected = form
            .get(field.column)
            .map(String::as_str)
            .unwrap_or(field.options[0]);
        if selected == field.options[0] {
            continue;
        }
        all_default = false;
        if let Some(reason) = reason_for(field.column, selected) {
            reasons.push(reason);
        }
    }
    if all_default {
        return Decision {
            code: DecisionCode::Accept,
            note: String::new(),
        };
    }
    let note = if reasons.is_empty() {
        REJECTION_FALLBACK.to_string()
    } else {
        reasons.join("\n")
    };
    Decision {
        code: DecisionCode::Reject,
        note,
    }
}
