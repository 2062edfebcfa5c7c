use std::error::Error;
use std::io::Read;

use graver_json::{json_query, ResultType};

/// Reads a JSON document from stdin and prints the query result:
/// `graver-json '<path>' [--paths] < document.json`
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: graver-json '<path>' [--paths] < document.json");
            std::process::exit(2);
        }
    };
    let result_type = if args.any(|a| a == "--paths") {
        ResultType::Path
    } else {
        ResultType::Value
    };

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let root: serde_json::Value = serde_json::from_str(&input)?;

    let result = json_query(&root, &path, result_type)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
