use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shinsa_core::importer::{split_fields, RosterImporter};
use shinsa_core::model::Sensei;
use shinsa_core::normalize::normalize_date;
use shinsa_core::traits::UuidGenerator;
use shinsa_core::RankOrdering;

fn bench_split_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_fields");

    let plain = "Ana Souza;123.456.789-00;F;15/03/08;Amarela;Miyagi";
    let quoted = r#""Souza, Ana",123.456.789-00,F,15/03/2008,"Amarela","Miyagi""#;

    group.bench_function("semicolon", |b| b.iter(|| split_fields(black_box(plain))));
    group.bench_function("quoted_comma", |b| {
        b.iter(|| split_fields(black_box(quoted)))
    });
    group.bench_function("normalize_date", |b| {
        b.iter(|| normalize_date(black_box("15/03/08")))
    });

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    let senseis = vec![
        Sensei {
            id: "k1".into(),
            name: "Miyagi".into(),
        },
        Sensei {
            id: "k2".into(),
            name: "Kano".into(),
        },
    ];
    let ranks = RankOrdering::standard();
    let importer = RosterImporter::new(&senseis, &ranks);

    let small = generate_roster(20);
    let medium = generate_roster(500);
    let large = generate_roster(5000);

    group.bench_function("20_rows", |b| {
        b.iter(|| importer.import(black_box(&small), &UuidGenerator))
    });
    group.bench_function("500_rows", |b| {
        b.iter(|| importer.import(black_box(&medium), &UuidGenerator))
    });
    group.bench_function("5000_rows", |b| {
        b.iter(|| importer.import(black_box(&large), &UuidGenerator))
    });

    group.finish();
}

/// Mixes both column layouts, blank names and unknown ranks.
fn generate_roster(n: usize) -> String {
    let ranks = ["Branca", "Amarela", "Verde", "Roxa", "Marrom", "Rosa"];
    let mut s = String::from("Nome;CPF;Sexo;Nascimento;Faixa;Sensei\n");
    for i in 0..n {
        let rank = ranks[i % ranks.len()];
        let line = match i % 10 {
            0 => format!(";{i};M;01/01/2000;{rank};Miyagi\n"),
            1..=3 => format!("Aluno {i};Kano;{i};F;{:02}/06/1999;{rank}\n", i % 28 + 1),
            _ => format!("Aluno {i};{i};M;{:02}/03/05;{rank};Miyagi\n", i % 28 + 1),
        };
        s.push_str(&line);
    }
    s
}

criterion_group!(benches, bench_split_fields, bench_import);
criterion_main!(benches);
