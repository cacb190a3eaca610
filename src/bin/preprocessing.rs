use polars::prelude::*;
use std::fs::File;

/// Cleans a raw scraped episodes CSV into the `Episode,Characters` file the
/// pipeline consumes: keeps only those two columns and drops rows whose
/// characters field is empty or whitespace.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let df = CsvReader::from_path("data/episodes_raw.csv")?
        .infer_schema(None)
        .finish()?;

    let df = df.select(&["Episode", "Characters"])?;

    let has_characters = df
        .column("Characters")?
        .utf8()?
        .into_iter()
        .map(|opt_val| Some(opt_val.map_or(false, |val| !val.trim().is_empty())))
        .collect::<BooleanChunked>();

    let mut cleaned = df.filter(&has_characters)?;
    println!(
        "Kept {} of {} episodes with recorded characters",
        cleaned.height(),
        df.height()
    );
    println!("{:?}", cleaned.head(Some(5)));

    let mut file = File::create("data/episodes.csv")?;
    CsvWriter::new(&mut file).finish(&mut cleaned)?;

    Ok(())
}
