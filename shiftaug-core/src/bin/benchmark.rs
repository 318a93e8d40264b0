fn main() {
    if let Err(e) = run() {
        eprintln!("benchmark failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde::Serialize;
    use shiftaug_core::{AudioBatch, Shift, ShiftUnit};
    use std::path::PathBuf;
    use std::time::Instant;

    #[derive(Debug)]
    struct Args {
        batch_size: usize,
        channels: usize,
        frames: usize,
        iterations: usize,
        seed: u64,
        output: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Serialize)]
    struct CaseResult {
        rollover: bool,
        iteration: usize,
        randomize_ms: f64,
        apply_ms: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    struct PolicySummary {
        rollover: bool,
        runs: usize,
        p50_apply_ms: f64,
        p95_apply_ms: f64,
        avg_apply_ms: f64,
        avg_randomize_ms: f64,
        samples_per_sec: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    struct Summary {
        batch_size: usize,
        channels: usize,
        frames: usize,
        iterations: usize,
        seed: u64,
        policies: Vec<PolicySummary>,
        cases: Vec<CaseResult>,
    }

    fn parse_value<T: std::str::FromStr>(
        it: &mut impl Iterator<Item = String>,
        flag: &str,
    ) -> Result<T, String> {
        let Some(v) = it.next() else {
            return Err(format!("missing value for {flag}"));
        };
        v.parse::<T>()
            .map_err(|_| format!("invalid value for {flag}: {v}"))
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            batch_size: 64,
            channels: 2,
            frames: 16_000 * 4,
            iterations: 20,
            seed: 0,
            output: None,
        };

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--batch" => args.batch_size = parse_value(&mut it, "--batch")?,
                "--channels" => args.channels = parse_value(&mut it, "--channels")?,
                "--frames" => args.frames = parse_value(&mut it, "--frames")?,
                "--iterations" => {
                    args.iterations = parse_value::<usize>(&mut it, "--iterations")?.clamp(1, 1000)
                }
                "--seed" => args.seed = parse_value(&mut it, "--seed")?,
                "--output" => args.output = Some(parse_value(&mut it, "--output")?),
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run --release -p shiftaug-core --bin benchmark -- \\
  [--batch <n>] [--channels <n>] [--frames <n>] [--iterations <n>] [--seed <n>] [--output <file.json>]"
                    );
                    std::process::exit(0);
                }
                other => {
                    return Err(format!("unknown argument: {other}"));
                }
            }
        }
        Ok(args)
    }

    fn percentile(values: &[f64], p: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        if sorted.len() == 1 {
            return sorted[0];
        }
        let idx = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    let args = parse_args()?;
    let batch = AudioBatch::new(Array3::from_shape_fn(
        (args.batch_size, args.channels, args.frames),
        |(b, c, t)| ((b * 31 + c * 7 + t) % 97) as f32 / 97.0 - 0.5,
    ));
    let total_samples = (args.batch_size * args.channels * args.frames) as f64;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut cases = Vec::new();
    let mut policies = Vec::new();
    for rollover in [true, false] {
        let shift =
            Shift::new(-0.5, 0.5, ShiftUnit::Fraction, rollover).map_err(|e| e.to_string())?;
        let mut rows = Vec::with_capacity(args.iterations);

        for iteration in 1..=args.iterations {
            let started = Instant::now();
            let shifts = shift
                .randomize(&batch, None, &mut rng)
                .map_err(|e| e.to_string())?;
            let randomize_ms = started.elapsed().as_secs_f64() * 1000.0;

            let started = Instant::now();
            let shifted = shift.apply(&batch, &shifts).map_err(|e| e.to_string())?;
            let apply_ms = started.elapsed().as_secs_f64() * 1000.0;
            std::hint::black_box(&shifted);

            println!(
                "rollover={rollover} [{iteration}/{iters}] {apply_ms:.2} ms",
                iters = args.iterations
            );
            rows.push(CaseResult {
                rollover,
                iteration,
                randomize_ms,
                apply_ms,
            });
        }

        let apply = rows.iter().map(|r| r.apply_ms).collect::<Vec<_>>();
        let randomize = rows.iter().map(|r| r.randomize_ms).collect::<Vec<_>>();
        let avg_apply_ms = mean(&apply);
        policies.push(PolicySummary {
            rollover,
            runs: rows.len(),
            p50_apply_ms: percentile(&apply, 0.50),
            p95_apply_ms: percentile(&apply, 0.95),
            avg_apply_ms,
            avg_randomize_ms: mean(&randomize),
            samples_per_sec: if avg_apply_ms > 0.0 {
                total_samples / (avg_apply_ms / 1000.0)
            } else {
                0.0
            },
        });
        cases.extend(rows);
    }

    for p in &policies {
        println!(
            "Done. rollover={} runs={} p50={:.2}ms p95={:.2}ms throughput={:.1} Msamples/s",
            p.rollover,
            p.runs,
            p.p50_apply_ms,
            p.p95_apply_ms,
            p.samples_per_sec / 1.0e6
        );
    }

    let summary = Summary {
        batch_size: args.batch_size,
        channels: args.channels,
        frames: args.frames,
        iterations: args.iterations,
        seed: args.seed,
        policies,
        cases,
    };

    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&out, json).map_err(|e| e.to_string())?;
        println!("Wrote benchmark report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
