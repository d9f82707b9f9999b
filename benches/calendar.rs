// benches/calendar.rs
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use econ_scrape::core::html::Document;
use econ_scrape::core::scalar::normalize;
use econ_scrape::scrape::parse_page;
use econ_scrape::specs::calendar::locate;

/// History page with `n` release rows behind a few decoy tables.
fn synthetic_page(n: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..5 {
        html.push_str(&format!("<table><tr><td>Popular {i}</td><td>1.2%</td></tr></table>"));
    }
    html.push_str(
        "<table id=\"eventHistoryTable\"><thead><tr><th>Release Date</th><th>Time</th>\
         <th>Actual</th><th>Forecast</th><th>Previous</th><th></th></tr></thead><tbody>",
    );
    for i in 0..n {
        let day = i % 28 + 1;
        html.push_str(&format!(
            "<tr><td>Sep {day:02}, 2025 (Aug)</td><td>15:30</td><td>{}K</td>\
             <td>{}K</td><td>{},{}M</td><td></td></tr>",
            200 + i % 40,
            210 + i % 30,
            1 + i % 3,
            i % 10,
        ));
    }
    html.push_str("</tbody></table></body></html>");
    html
}

fn bench_calendar(c: &mut Criterion) {
    let page = synthetic_page(200);
    let tz = chrono_tz::Europe::Moscow;

    c.bench_function("locate_table", |b| {
        b.iter(|| {
            let doc = Document::parse(black_box(&page)).unwrap();
            black_box(locate(&doc).is_ok())
        })
    });

    c.bench_function("parse_page_200_rows", |b| {
        b.iter(|| {
            let rows = parse_page(black_box(&page), 200, tz).unwrap();
            black_box(rows.len())
        })
    });

    let cells = ["227K", "3.2%", "-1,5", "1,234,567", "₽ 12.5B", "—", "0.25 %", "229K revised from 231K"];
    c.bench_function("normalize_scalars", |b| {
        b.iter(|| {
            for s in cells {
                black_box(normalize(black_box(s)));
            }
        })
    });
}

criterion_group!(benches, bench_calendar);
criterion_main!(benches);
