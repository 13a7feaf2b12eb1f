//! Writes deterministic sample HST and GALEX query results for trying out
//! `archive-filter`:
//!
//! ```text
//! generate_sample [OUT_DIR]
//!   → hst_results.parquet,   hst_results.json
//!   → galex_results.parquet, galex_results.json
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use archive_filter::{write_table, CellValue, OutputFormat, ResultTable, Row};
use log::info;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn row(cells: Vec<(&str, CellValue)>) -> Row {
    cells
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// M82 field, mixed instruments, bands and product kinds.
fn hst_results(rng: &mut SimpleRng) -> ResultTable {
    let instruments = ["WFC3/IR", "WFC3/UVIS", "ACS/WFC"];
    let bands = ["F128N", "F160W", "F658N", "F814W"];
    let products = ["preview", "science", "auxiliary"];

    let rows = (0..120)
        .map(|i| {
            let exptime = (rng.next_f64() * 1200.0).round();
            row(vec![
                ("name", format!("ib6w{:02}{:03}", rng.next_u64() % 40, i).into()),
                ("insname", rng.pick(&instruments).into()),
                ("productType", rng.pick(&products).into()),
                ("energy_bandpassName", rng.pick(&bands).into()),
                ("s_ra", CellValue::Float(148.968 + rng.next_f64() * 0.05)),
                ("s_dec", CellValue::Float(69.679 + rng.next_f64() * 0.05)),
                ("t_exptime", CellValue::Float(exptime)),
            ])
        })
        .collect();

    ResultTable::new(
        [
            "name",
            "insname",
            "productType",
            "energy_bandpassName",
            "s_ra",
            "s_dec",
            "t_exptime",
        ]
        .map(String::from)
        .to_vec(),
        rows,
    )
}

/// Tile names mix the `_M82` and `M82_` spellings, sizes and product kinds.
fn galex_results(rng: &mut SimpleRng) -> ResultTable {
    let prefixes = ["NGC3034_M82", "M82", "GI1_009003_M82", "AIS_274"];
    let sizes = ["large", "small", "int"];
    let bands = ["FUV", "NUV"];
    let products = ["PREVIEW", "SCIENCE", "preview"];

    let rows = (0..60)
        .map(|i| {
            let name = format!(
                "{}_{}_{}_{:02}",
                rng.pick(&prefixes),
                rng.pick(&sizes),
                rng.pick(&bands),
                i
            );
            row(vec![
                ("name", name.into()),
                ("productType", rng.pick(&products).into()),
                ("energy_bandpassName", rng.pick(&bands).into()),
                ("t_exptime", CellValue::Integer((rng.next_u64() % 3000) as i64)),
            ])
        })
        .collect();

    ResultTable::new(
        ["name", "productType", "energy_bandpassName", "t_exptime"]
            .map(String::from)
            .to_vec(),
        rows,
    )
}

fn write(dir: &Path, stem: &str, table: &ResultTable) -> Result<()> {
    for (ext, format) in [("parquet", OutputFormat::Parquet), ("json", OutputFormat::Json)] {
        let path = dir.join(format!("{stem}.{ext}"));
        let file =
            File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_table(table, format, BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {} rows to {}", table.len(), path.display());
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    write(&out_dir, "hst_results", &hst_results(&mut rng))?;
    write(&out_dir, "galex_results", &galex_results(&mut rng))?;
    Ok(())
}
