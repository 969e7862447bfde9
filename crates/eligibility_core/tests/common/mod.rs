//! Shared fixture: a small fitted bundle written to a temp directory

#![allow(dead_code)]

use pkh_eligibility_core::{load_context_from_dir, ApplicantRecord, InferenceContext};
use std::path::Path;
use tempfile::TempDir;

pub const NUMERIC: &str = r#"["Umur", "Jumlah Tanggungan", "Penghasilan", "Jumlah Anak Sekolah"]"#;

pub const CATEGORICAL: &str =
    r#"["Pekerjaan", "Status Perkawinan", "Pendidikan", "Status Rumah", "L/P", "Memiliki Kendaraan"]"#;

pub const SELECTED: &str = r#"[
  "Umur", "Jumlah Tanggungan", "Penghasilan", "Jumlah Anak Sekolah",
  "Pekerjaan_TIDAK ADA", "Pekerjaan_PEGAWAI", "Status Perkawinan_CERAI MATI",
  "Pendidikan_S1", "Status Rumah_MILIK SENDIRI", "Memiliki Kendaraan_Ya"
]"#;

pub const ENCODER: &str = r#"{
  "feature_names_in": ["Pekerjaan", "Status Perkawinan", "Pendidikan", "Status Rumah", "L/P", "Memiliki Kendaraan"],
  "categories": [
    ["ASISTEN RUMAH TANGGA", "BERTANI", "BURUH", "KARYAWAN SWASTA", "PEDAGANG", "PEGAWAI", "PETERNAK", "TIDAK ADA", "WIRASWASTA"],
    ["BELUM MENIKAH", "CERAI HIDUP", "CERAI MATI", "MENIKAH"],
    ["S1", "SD", "SMA", "SMP"],
    ["BEBAS SEWA", "KONTRAK", "MENUMPANG", "MILIK ORANG TUA", "MILIK SENDIRI"],
    ["L", "P"],
    ["Tidak", "Ya"]
  ],
  "drop_idx": null,
  "handle_unknown": "error"
}"#;

pub const SCALER: &str = r#"{
  "kind": "standard",
  "mean": [44.7, 3.1, 1850000.0, 1.4, 0.18, 0.07, 0.11, 0.09, 0.52, 0.31],
  "scale": [12.9, 1.6, 1120000.0, 1.1, 0.384, 0.255, 0.313, 0.286, 0.4996, 0.4625]
}"#;

pub const MODEL: &str = r#"{
  "kind": "logistic_regression",
  "coef": [0.21, -0.84, 1.37, -0.62, -0.95, 1.12, -0.48, 0.88, 0.41, 0.97],
  "intercept": -0.35
}"#;

pub const BATCH_CSV: &str = "\
No,Nama,Umur,Jumlah Tanggungan,Penghasilan,Jumlah Anak Sekolah,Pekerjaan,Status Perkawinan,Pendidikan,Status Rumah,L/P,Memiliki Kendaraan,Status Kelayakan
1,Siti Aminah,46,5,650000,3,BURUH,CERAI MATI,SD,MENUMPANG,P,Tidak,LAYAK
2,Budi Santoso,38,2,4800000,1,PEGAWAI,MENIKAH,S1,MILIK SENDIRI,L,Ya,TIDAK LAYAK
3,Wartini,61,4,300000,2,TIDAK ADA,CERAI MATI,SD,BEBAS SEWA,P,Tidak,LAYAK
4,Ahmad Fauzi,33,3,2100000,2,PEDAGANG,MENIKAH,SMA,KONTRAK,L,Tidak,LAYAK
5,Dewi Lestari,29,1,3900000,0,KARYAWAN SWASTA,BELUM MENIKAH,S1,MILIK ORANG TUA,P,Ya,LAYAK
";

/// Write every artifact under `dir` with the default file names
pub fn write_bundle(dir: &Path) {
    for (file, content) in [
        ("numerical_features.json", NUMERIC),
        ("categorical_features.json", CATEGORICAL),
        ("selected_features.json", SELECTED),
        ("ohe.json", ENCODER),
        ("scaler.json", SCALER),
        ("model.json", MODEL),
    ] {
        std::fs::write(dir.join(file), content).unwrap();
    }
}

/// Temp bundle and the context loaded from it
pub fn bundle() -> (TempDir, InferenceContext) {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());
    let ctx = load_context_from_dir(dir.path()).unwrap();
    (dir, ctx)
}

/// Low-income widow with several dependents
pub fn eligible_applicant() -> ApplicantRecord {
    ApplicantRecord::new()
        .with("Umur", 46_i64)
        .with("Jumlah Tanggungan", 5_i64)
        .with("Penghasilan", 650_000_i64)
        .with("Jumlah Anak Sekolah", 3_i64)
        .with("Pekerjaan", "BURUH")
        .with("Status Perkawinan", "CERAI MATI")
        .with("Pendidikan", "SD")
        .with("Status Rumah", "MENUMPANG")
        .with("L/P", "P")
        .with("Memiliki Kendaraan", "Tidak")
}

/// Salaried civil servant who owns a house and a vehicle
pub fn ineligible_applicant() -> ApplicantRecord {
    ApplicantRecord::new()
        .with("Umur", 38_i64)
        .with("Jumlah Tanggungan", 2_i64)
        .with("Penghasilan", 4_800_000_i64)
        .with("Jumlah Anak Sekolah", 1_i64)
        .with("Pekerjaan", "PEGAWAI")
        .with("Status Perkawinan", "MENIKAH")
        .with("Pendidikan", "S1")
        .with("Status Rumah", "MILIK SENDIRI")
        .with("L/P", "L")
        .with("Memiliki Kendaraan", "Ya")
}
