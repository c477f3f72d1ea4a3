use criterion::{black_box, criterion_group, criterion_main, Criterion};
use student_roster::import::{map_rows, split_lines, tokenize_line, ColumnMapping};
use student_roster::roster::Roster;
use student_roster::store::MemoryStore;

fn roster_csv(rows: usize) -> String {
    let mut text = String::from("Nome,Celular,Email\n");
    for i in 0..rows {
        text.push_str(&format!(
            "\"Aluno {0}\",11988{0:06},aluno{0}@example.com\n",
            i
        ));
    }
    text
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize_quoted_line", |b| {
        b.iter(|| {
            tokenize_line(black_box(
                r#""Silva, Ana";"+55 11 98888-7777";"ana@example.com""#,
            ))
        })
    });

    let small = roster_csv(1_000);
    c.bench_function("map_rows_1k", |b| {
        b.iter(|| {
            let lines = split_lines(black_box(&small));
            let mapping = ColumnMapping::detect(&tokenize_line(lines[0]));
            map_rows(&lines, &mapping, "Imersão Inside")
        })
    });

    let large = roster_csv(10_000);
    c.bench_function("import_10k_rows", |b| {
        b.iter(|| {
            let store = MemoryStore::default();
            let mut roster = Roster::default();
            roster.import_csv(&store, black_box(&large), None, "Imersão Inside")
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
