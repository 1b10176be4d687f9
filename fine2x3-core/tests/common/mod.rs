use fine2x3_core::{Catalog, CatalogOpts, Construction, EnumOpts, GraphDef, MemoryStore, enumerate};

/// Opens a prime catalog and fills it with every graph of up to
/// `vertex_max` vertices.
#[must_use]
pub fn filled_catalog(vertex_max: usize, trace_count: usize) -> Catalog<MemoryStore> {
    let catalog = CatalogOpts::new()
        .with_trace_count(trace_count)
        .with_primes(true)
        .open(MemoryStore::new())
        .expect("catalog should open");
    enumerate(EnumOpts::new(vertex_max))
        .expect("options should be valid")
        .add_to(&catalog)
        .expect("graphs should be added");
    catalog
}

/// Builds a graph from natural-sign edges.
#[must_use]
pub fn graph(vertex_count: usize, edges: &[(u8, u8)]) -> Construction {
    Construction::from_def(&GraphDef::natural(vertex_count, edges))
        .expect("test graph should be well formed")
}
