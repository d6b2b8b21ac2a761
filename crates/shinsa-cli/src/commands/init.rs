//! The `shinsa init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("shinsa.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("sample-roster.csv"), SAMPLE_ROSTER)?;

    println!("\nNext steps:");
    println!("  1. Add your senseis: shinsa sensei add --name \"Miyagi\"");
    println!("  2. Import a roster: shinsa import --file sample-roster.csv");
    println!("  3. Schedule an exam: shinsa exam add --date 21/11/2026 --location \"Dojo\"");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# shinsa configuration

# Max concurrent store requests when marking attendance or deleting in bulk.
parallelism = 4

[store]
type = "json"
path = "shinsa-data.json"
"#;

const SAMPLE_ROSTER: &str = "\
Nome;CPF;Sexo;Nascimento;Faixa;Sensei
Ana Souza;123.456.789-00;F;15/03/08;Amarela;Miyagi
Bruno Lima;987.654.321-00;M;02/11/1995;Verde;Miyagi
Carla Dias;;F;2001-07-20;Branca;
";
