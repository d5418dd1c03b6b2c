use olc::assembly::{assemble, AssemblyConfig};
use olc::store::SequenceStore;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const FRAGMENT_LEN: usize = 100;
const OVERLAP_LEN: usize = 40;

/// A chain of fragments tiling a pseudo-random genome, as FASTA, along
/// with the SAM an all-vs-all aligner would report for neighbours.
fn synthetic_chain(count: usize) -> (Vec<u8>, String) {
    let step = FRAGMENT_LEN - OVERLAP_LEN;
    let genome_len = step * count + OVERLAP_LEN;

    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let genome: Vec<u8> = (0..genome_len)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            b"ACGT"[(state >> 62) as usize]
        })
        .collect();

    let mut fasta = Vec::new();
    let mut sam = String::from("@HD\tVN:1.6\tSO:unsorted\n");
    for i in 0..count {
        let start = i * step;
        fasta.extend_from_slice(format!(">r{}\n", i).as_bytes());
        fasta.extend_from_slice(&genome[start..start + FRAGMENT_LEN]);
        fasta.push(b'\n');
        sam.push_str(&format!("@SQ\tSN:r{}\tLN:{}\n", i, FRAGMENT_LEN));
    }
    for i in 1..count {
        sam.push_str(&format!(
            "r{}\t0\tr{}\t{}\t60\t{}M{}S\t*\t0\t0\t*\t*\tAS:i:{}\n",
            i,
            i - 1,
            step + 1,
            OVERLAP_LEN,
            FRAGMENT_LEN - OVERLAP_LEN,
            OVERLAP_LEN
        ));
    }
    (fasta, sam)
}

macro_rules! bench_chain {
    ($name:ident, $count:literal) => {
        fn $name(c: &mut Criterion) {
            let (fasta, sam) = synthetic_chain($count);
            let store = SequenceStore::from_bytes(&fasta).unwrap();
            let config = AssemblyConfig::default();
            c.bench_with_input(
                BenchmarkId::new("assemble_chain", $count),
                &sam,
                |b, sam| {
                    b.iter(|| {
                        let mut out = Vec::new();
                        assemble(sam.as_bytes(), &store, &config, &mut out)
                            .unwrap()
                    });
                },
            );
        }
    };
}

bench_chain!(chain_100, 100);
bench_chain!(chain_1000, 1000);
bench_chain!(chain_5000, 5000);

criterion_group!(benches, chain_100, chain_1000, chain_5000);
criterion_main!(benches);
