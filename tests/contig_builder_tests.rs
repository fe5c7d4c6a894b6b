//! Contig construction over small hand-built read sets plus randomized
//! property checks

use contig_forge::assembly::{DeBruijnGraph, SimplePathContigBuilder};
use contig_forge::core::kmer::{reverse_complement, KmerValue};
use contig_forge::Sequence;
use std::collections::HashSet;

fn reads(seqs: &[&str]) -> Vec<Sequence> {
    seqs.iter()
        .enumerate()
        .map(|(i, s)| Sequence::from_str_with_id(format!("read_{i}"), s))
        .collect()
}

fn assemble(seqs: &[Sequence], k: usize) -> (DeBruijnGraph, Vec<String>) {
    let mut graph = DeBruijnGraph::build(seqs, k).unwrap();
    let contigs = SimplePathContigBuilder::new().build(&mut graph).unwrap();
    let mut out: Vec<String> = contigs.iter().map(|c| c.to_string()).collect();
    out.sort();
    (graph, out)
}

fn canonical_kmers(contig: &str, k: usize) -> Vec<u64> {
    contig
        .as_bytes()
        .windows(k)
        .map(|w| KmerValue::from_sequence(w).unwrap().0.bits())
        .collect()
}

fn rc(s: &str) -> String {
    String::from_utf8(reverse_complement(s.as_bytes())).unwrap()
}

#[test]
fn test_linear_read_becomes_one_contig() {
    let (_, contigs) = assemble(&reads(&["ATGGCGTACCTTAGCAAGTC"]), 7);
    assert_eq!(contigs, vec!["ATGGCGTACCTTAGCAAGTC"]);
}

#[test]
fn test_overlapping_reads_join() {
    let (_, contigs) = assemble(&reads(&["ATGGCGTACCTTAG", "CGTACCTTAGCAAGTC"]), 7);
    assert_eq!(contigs, vec!["ATGGCGTACCTTAGCAAGTC"]);
}

#[test]
fn test_reverse_complement_reads_join() {
    let (_, contigs) = assemble(&reads(&["ATGGCGTACCTTAG", &rc("CGTACCTTAGCAAGTC")]), 7);
    assert_eq!(contigs, vec!["ATGGCGTACCTTAGCAAGTC"]);
}

#[test]
fn test_branch_splits_contigs() {
    let (_, contigs) = assemble(&reads(&["ATGGCGTACCTTAGCA", "ATGGCGTACCTTTGTCA"]), 7);
    assert_eq!(contigs, vec!["ATGGCGTACCTT", "TACCTTTGTCA", "TGCTAAGGTA"]);
}

#[test]
fn test_isolated_kmer_is_its_own_contig() {
    let (_, contigs) = assemble(&reads(&["GATTACA"]), 7);
    assert_eq!(contigs, vec!["TGTAATC"]);
}

#[test]
fn test_palindrome_terminates_paths() {
    let (graph, contigs) = assemble(&reads(&["TTACGTCC"]), 4);
    assert_eq!(contigs, vec!["ACGT", "CGTCC", "TTACG"]);

    let palindrome = graph.node(graph.find(b"ACGT").unwrap());
    assert!(palindrome.is_palindrome(4));
    assert_eq!(palindrome.extensions(contig_forge::assembly::Side::Left).len(), 0);
    assert_eq!(palindrome.extensions(contig_forge::assembly::Side::Right).len(), 0);
}

#[test]
fn test_circular_genome_emitted_once() {
    let unit = "CCGTAATGCCTT";
    let circular = format!("{}{}", unit, &unit[..6]);
    let (graph, contigs) = assemble(&reads(&[&circular]), 7);

    assert_eq!(graph.node_count(), 12);
    assert_eq!(contigs.len(), 1);
    let contig = &contigs[0];
    assert_eq!(contig.len(), 18);

    // the first 12 symbols are a rotation of one strand of the unit
    let doubled = format!("{unit}{unit}");
    let doubled_rc = rc(&doubled);
    let head = &contig[..12];
    assert!(doubled.contains(head) || doubled_rc.contains(head));
    assert_eq!(
        canonical_kmers(contig, 7).into_iter().collect::<HashSet<_>>().len(),
        12
    );
}

#[test]
fn test_low_coverage_path_removed_before_build() {
    let mut input = vec!["ATGGCGTACCTTAGCA"; 5];
    input.push("GGTCAACTGTTCGAGC");
    let input = reads(&input);

    let (_, unfiltered) = assemble(&input, 7);
    assert_eq!(unfiltered, vec!["GGTCAACTGTTCGAGC", "TGCTAAGGTACGCCAT"]);

    let builder = SimplePathContigBuilder::new();
    let mut graph = DeBruijnGraph::build(&input, 7).unwrap();
    assert_eq!(builder.remove_low_coverage_contigs(&mut graph, 3.0).unwrap(), 10);
    let contigs: Vec<String> = builder
        .build(&mut graph)
        .unwrap()
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(contigs, vec!["TGCTAAGGTACGCCAT"]);
}

#[test]
fn test_empty_graph_yields_no_contigs() {
    let (graph, contigs) = assemble(&reads(&["ACG", "NNNNNNNN"]), 5);
    assert!(graph.is_empty());
    assert!(contigs.is_empty());
}

/// Random reads (either strand) sampled from a random genome
fn random_read_set(seed: u64) -> (Vec<Sequence>, usize) {
    fastrand::seed(seed);
    let bases = [b'A', b'C', b'G', b'T'];
    let genome_len = fastrand::usize(60..=300);
    let mut genome: Vec<u8> = (0..genome_len).map(|_| bases[fastrand::usize(0..4)]).collect();
    if seed % 3 == 0 {
        // introduce a repeat
        let repeat = genome[10..40].to_vec();
        genome.extend_from_slice(&repeat);
    }

    let k = [4, 5, 7, 8, 9, 11, 13][fastrand::usize(0..7)];
    let read_count = fastrand::usize(3..=30);
    let reads = (0..read_count)
        .map(|i| {
            let len = fastrand::usize(k..=60.min(genome.len()));
            let start = fastrand::usize(0..=genome.len() - len);
            let mut read = genome[start..start + len].to_vec();
            if fastrand::bool() {
                read = reverse_complement(&read);
            }
            Sequence::new(format!("read_{i}"), read)
        })
        .collect();
    (reads, k)
}

#[test]
fn test_random_reads_cover_every_node_exactly_once() {
    for seed in 0..60 {
        let (input, k) = random_read_set(seed);
        let (graph, contigs) = assemble(&input, k);

        let mut seen: Vec<u64> = Vec::new();
        for contig in &contigs {
            assert!(contig.len() >= k);
            let kmers = canonical_kmers(contig, k);
            let distinct: HashSet<u64> = kmers.iter().copied().collect();
            assert_eq!(distinct.len(), kmers.len(), "seed {seed}: contig revisits a node");
            seen.extend(kmers);
        }
        seen.sort_unstable();
        let mut nodes: Vec<u64> = graph.nodes().iter().map(|n| n.value().bits()).collect();
        nodes.sort_unstable();
        assert_eq!(seen, nodes, "seed {seed}: nodes not covered exactly once");
    }
}

#[test]
fn test_random_reads_no_duplicate_contigs() {
    for seed in 100..160 {
        let (input, k) = random_read_set(seed);
        let (_, contigs) = assemble(&input, k);

        let set: HashSet<&String> = contigs.iter().collect();
        assert_eq!(set.len(), contigs.len(), "seed {seed}");
        for contig in &contigs {
            let reverse = rc(contig);
            if &reverse != contig {
                assert!(!set.contains(&reverse), "seed {seed}: {contig} emitted both ways");
            }
        }
    }
}

#[test]
fn test_random_reads_build_is_repeatable() {
    for seed in 200..240 {
        let (input, k) = random_read_set(seed);
        let (_, first) = assemble(&input, k);
        let (_, second) = assemble(&input, k);
        assert_eq!(first, second, "seed {seed}");
    }
}

#[test]
fn test_coverage_pass_leaves_graph_reusable() {
    let builder = SimplePathContigBuilder::new();
    for seed in 300..340 {
        let (input, k) = random_read_set(seed);
        let (_, expected) = assemble(&input, k);

        let mut graph = DeBruijnGraph::build(&input, k).unwrap();
        assert_eq!(builder.remove_low_coverage_contigs(&mut graph, 0.5).unwrap(), 0);
        let mut contigs: Vec<String> = builder
            .build(&mut graph)
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        contigs.sort();
        assert_eq!(contigs, expected, "seed {seed}");
    }
}
