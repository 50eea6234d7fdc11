use criterion::{criterion_group, criterion_main, Criterion};
use hypernav::api::{ApiBuilder, LinkRelation, Verb};
use hypernav::link::{Link, RelationCatalog};
use hypernav::model::{DocumentModel, Model};
use hypernav::registry::ApiRegistry;
use hypernav::schema::{Prototype, StaticSchemaService, ValueKind};
use hypernav::services::Services;
use std::hint::black_box;
use std::sync::Arc;

const ZOO: &str = "http://zoo.example";

fn registry() -> ApiRegistry {
    let schemas = StaticSchemaService::new()
        .with_prototype(Prototype::new("Animal").key_slot("id", ValueKind::Integer))
        .with_prototype(
            Prototype::new("Section")
                .key_slot("category", ValueKind::Text)
                .key_slot("id", ValueKind::Integer)
                .key_slot("habitat_id", ValueKind::Integer)
                .key_slot("section_id", ValueKind::Integer),
        );
    let relations = RelationCatalog::with_relations([
        LinkRelation::new("self", Verb::Get),
        LinkRelation::new("toy", Verb::Get),
    ]);
    let registry = ApiRegistry::new(Services::new(Arc::new(schemas), Arc::new(relations)));

    let mut builder = ApiBuilder::new(ZOO);
    for path in [
        "/zoo/animals",
        "/zoo/health",
        "/zoo/animals/{id}",
        "/zoo/animals/{id}/toys/{toy_id}",
        "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
        "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}",
        "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}",
    ] {
        builder = builder.resource(path, None).link(path, "self", path);
    }
    let api = builder
        .resource("/zoo/animals/{id}", Some("Animal"))
        .resource(
            "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
            Some("Section"),
        )
        .link("/zoo/animals/{id}", "toy", "/zoo/animals/{id}/toys/{toy_id}")
        .build()
        .unwrap();
    registry.load_api(api).unwrap();

    for i in 0..16 {
        let api = ApiBuilder::new(format!("http://api{i}.example"))
            .resource("/items/{id}", None)
            .link("/items/{id}", "self", "/items/{id}")
            .build()
            .unwrap();
        registry.load_api(api).unwrap();
    }
    registry
}

fn bench_match_throughput(c: &mut Criterion) {
    let registry = registry();
    let nav = registry.api_navigator(ZOO).unwrap();
    let uris = [
        format!("{ZOO}/zoo/animals/123"),
        format!("{ZOO}/zoo/animals/123/toys/456"),
        format!("{ZOO}/zoo/cats/animals/123/habitats/88/sections/5"),
        format!("{ZOO}/inventory/1/feeds/2/items/3/batches/4"),
        format!("{ZOO}/complex/1/2/3/4/5/6/7/8/9"),
    ];

    c.bench_function("match_uri", |b| {
        b.iter(|| {
            for uri in &uris {
                black_box(nav.match_uri(black_box(uri)).ok());
            }
        })
    });

    c.bench_function("registry_owner_lookup", |b| {
        b.iter(|| {
            for uri in &uris {
                black_box(registry.get_parent_api_navigator(black_box(uri)).ok());
            }
        })
    });

    c.bench_function("surrogate_key", |b| {
        b.iter(|| {
            black_box(nav.surrogate_key(black_box(&uris[2]), "Section"));
        })
    });

    let uri = uris[0].clone();
    let animal: Arc<dyn Model> = Arc::new(
        DocumentModel::new("Animal")
            .with_uri(&uri)
            .with_slot("toy_id", 7),
    );
    let toy = Link::new("toy");
    c.bench_function("resolve_link", |b| {
        b.iter(|| {
            black_box(registry.resolve_link(&toy, &animal, &uri, None, None).ok());
        })
    });
}

criterion_group!(benches, bench_match_throughput);
criterion_main!(benches);
