use criterion::{criterion_group, criterion_main};

mod network {
    pub mod application {
        pub mod mqtt {
            pub mod client;
        }
    }
}

criterion_group!(
    benches,
    network::application::mqtt::client::bench_publish,
    network::application::mqtt::client::bench_yield_dispatch,
    network::application::mqtt::client::bench_payload_format
);
criterion_main!(benches);
