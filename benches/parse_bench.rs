use std::io::{Cursor, Write};

use chrono::{TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tust::core::*;
use tust::{avd, nfe, reconcile, xlsx};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const MAIN_NS: &str = tust::xlsx::SPREADSHEETML_NS;

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap())
}

fn period() -> BillingPeriod {
    BillingPeriod::new(2025, 10).unwrap()
}

/// AVD workbook with `items` transmitter rows.
fn avd_workbook(items: usize) -> Vec<u8> {
    let mut sst = vec![
        "EMP01".to_string(),
        "Empresa Um Ltda".into(),
        "Outubro/2025".into(),
        "1a. Parcela dia 15/11/2025".into(),
        "2a. Parcela dia 25/11/2025".into(),
        "3a. Parcela dia 05/12/2025".into(),
    ];
    let mut rows = String::from(concat!(
        r#"<row r="1"><c r="D1"><v>1234</v></c></row>"#,
        r#"<row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" t="s"><v>1</v></c><c r="D2" t="s"><v>2</v></c></row>"#,
        r#"<row r="3"><c r="D3"><v>45960.25</v></c></row>"#,
        r#"<row r="5"><c r="D5" t="s"><v>3</v></c><c r="E5" t="s"><v>4</v></c><c r="F5" t="s"><v>5</v></c></row>"#,
    ));
    for i in 0..items {
        let row = 6 + i;
        let code = sst.len();
        sst.push(format!("T{i:04}"));
        sst.push(format!("Transmissora {i}"));
        rows.push_str(&format!(
            r#"<row r="{row}"><c r="A{row}" t="s"><v>{code}</v></c><c r="B{row}" t="s"><v>{name}</v></c><c r="C{row}"><v>11222333000181</v></c><c r="D{row}"><v>{i}.50</v></c><c r="E{row}"><v>12.25</v></c><c r="F{row}"><v>0</v></c><c r="G{row}"><v>1.1</v></c><c r="H{row}"><v>{i}.75</v></c></row>"#,
            name = code + 1,
        ));
    }
    let sst: String = sst.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("xl/sharedStrings.xml", options).unwrap();
    zip.write_all(format!(r#"<sst xmlns="{MAIN_NS}">{sst}</sst>"#).as_bytes()).unwrap();
    zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
    zip.write_all(
        format!(r#"<worksheet xmlns="{MAIN_NS}"><sheetData>{rows}</sheetData></worksheet>"#)
            .as_bytes(),
    )
    .unwrap();
    zip.finish().unwrap().into_inner()
}

fn nfe_xml(number: usize) -> String {
    format!(
        r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe"><NFe><infNFe Id="NFe{number:044}">
<ide><serie>1</serie><nNF>{number}</nNF><dhEmi>2025-10-20T10:00:00-03:00</dhEmi></ide>
<emit><CNPJ>11222333000181</CNPJ><xNome>Transmissora Norte</xNome></emit>
<dest><CNPJ>99888777000166</CNPJ><xNome>Empresa Um Ltda</xNome></dest>
<total><ICMSTot><vProd>1.234,56</vProd><vNF>1.234,56</vNF></ICMSTot></total>
<cobr><fat><nFat>{number}</nFat></fat><dup><nDup>001</nDup><dVenc>2025-11-15</dVenc><vDup>1234.56</vDup></dup></cobr>
</infNFe></NFe></nfeProc>"#
    )
}

fn bench_read_workbook(c: &mut Criterion) {
    let bytes = avd_workbook(500);
    c.bench_function("xlsx_read_500_rows", |b| {
        b.iter(|| black_box(xlsx::read_workbook(black_box(&bytes))));
    });
}

fn bench_parse_avd(c: &mut Criterion) {
    let table = xlsx::read_workbook(&avd_workbook(500)).unwrap();
    c.bench_function("avd_parse_500_items", |b| {
        b.iter(|| black_box(avd::parse_avd(black_box(&table))));
    });
}

fn bench_parse_nfe(c: &mut Criterion) {
    let xml = nfe_xml(12345);
    let clock = clock();
    c.bench_function("nfe_parse", |b| {
        b.iter(|| black_box(nfe::parse_nfe(black_box(xml.as_bytes()), "T0001", period(), &clock)));
    });
}

fn bench_reconcile_100_invoices(c: &mut Criterion) {
    let table = xlsx::read_workbook(&avd_workbook(50)).unwrap();
    let (header, items) = avd::parse_avd(&table).unwrap();
    let clock = clock();
    let invoices: Vec<Invoice> = (0..100)
        .map(|n| nfe::parse_nfe(nfe_xml(n).as_bytes(), "T0001", period(), &clock).unwrap())
        .collect();

    let mut repo = InMemoryRepository::new();
    avd::import_debit_note(&mut repo, &header, &items, false).unwrap();
    repo.register_transmitter(Transmitter {
        ons_code: "T0001".into(),
        cnpj: "11222333000181".into(),
        name: "Transmissora Norte".into(),
    });

    c.bench_function("reconcile_100_invoices", |b| {
        b.iter_batched(
            || repo.clone(),
            |mut repo| {
                black_box(reconcile::reconcile(
                    &mut repo,
                    &clock,
                    "EMP01",
                    period(),
                    black_box(&invoices),
                ))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_read_workbook,
    bench_parse_avd,
    bench_parse_nfe,
    bench_reconcile_100_invoices,
);
criterion_main!(benches);
