use criterion::{black_box, criterion_group, criterion_main, Criterion};
use showcase_orchestrator::{Command, Inputs, Page, PageConfig, PageLayout};
use showcase_scene::{AssetPayload, ModelAsset};
use showcase_test_fixtures as fixtures;

fn landing() -> Page {
    let config: PageConfig = fixtures::pages::load("soda-landing").expect("page fixture");
    let layout: PageLayout = fixtures::layouts::load("soda-landing").expect("layout fixture");
    let mut page = Page::new(config, layout).expect("page builds");
    page.update(
        0.0,
        Inputs::command(Command::AssetLoaded {
            url: "models/soda_can.glb".into(),
            asset: AssetPayload::Model(ModelAsset::with_meshes(["cylinder_1", "cylinder_2"])),
        }),
    );
    page
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut page = landing();
    c.bench_function("page_tick_idle", |b| {
        b.iter(|| {
            let frame = page.update(black_box(1.0 / 60.0), Inputs::default());
            black_box(frame.scenes.len());
        })
    });
}

fn bench_scrolling_tick(c: &mut Criterion) {
    let mut page = landing();
    let mut scroll = 0.0_f32;
    c.bench_function("page_tick_scrolling", |b| {
        b.iter(|| {
            scroll = (scroll + 37.0) % 5700.0;
            let frame = page.update(black_box(1.0 / 60.0), Inputs::scrolled(scroll));
            black_box(frame.events.len());
        })
    });
}

criterion_group!(benches, bench_idle_tick, bench_scrolling_tick);
criterion_main!(benches);
