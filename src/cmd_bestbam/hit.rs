use bestbam::libs::classify::{write_report, Accumulator, Thresholds};
use bestbam::libs::error::HitError;
use bestbam::libs::merge::MergeCoordinator;
use bestbam::libs::select::{select_best, RandomPicker, Scoring};
use clap::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::time::Instant;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("hit")
        .about("Pick the best hit of every read across several alignment files")
        .after_help(
            r###"
Each input holds the alignments of the same reads against one genome, sorted by
read name (`samtools sort -n`). The inputs are merged by read name; for every read
the best-scoring hit wins, ties are broken at random.

Scoring:
* tag      - the AS tag; accepted when AS >= --min-score
* computed - match length - nM * --edit-penalty; accepted when the match length >= --min-len

Hits with an edit distance (nM, or NM) above --max-dist are rejected first.
Hits on references whose name contains --special (ERCC) are only counted.

Output:
* --keep: one `read<TAB>label` line per accepted read; .gz names are gzipped
* the run log (stderr or --log) ends with the counts and a tab-separated
  `stats` line: total, too low/short, too diverged, reads, special, multi,
  then one count per label

Examples:
  bestbam hit human.bam mouse.bam --labels human,mouse --keep keep.tsv.gz

  bestbam hit a.sam b.sam --sam --labels a,b --scoring computed --min-len 60

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Name-sorted alignment files, one per genome"),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .required(true)
                .num_args(1)
                .help("Comma-separated labels of the inputs, in the same order"),
        )
        .arg(
            Arg::new("scoring")
                .long("scoring")
                .num_args(1)
                .default_value("tag")
                .value_parser(["tag", "computed"])
                .help("How hits are scored"),
        )
        .arg(
            Arg::new("min_score")
                .long("min-score")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true)
                .help("Minimum alignment score (tag scoring)"),
        )
        .arg(
            Arg::new("min_len")
                .long("min-len")
                .num_args(1)
                .default_value("60")
                .value_parser(value_parser!(i64))
                .help("Minimum match length (computed scoring)"),
        )
        .arg(
            Arg::new("max_dist")
                .long("max-dist")
                .num_args(1)
                .default_value("5")
                .value_parser(value_parser!(i64))
                .help("Maximum edit distance of an accepted hit"),
        )
        .arg(
            Arg::new("edit_penalty")
                .long("edit-penalty")
                .num_args(1)
                .default_value("2.0")
                .value_parser(value_parser!(f64))
                .help("Multiple for how to penalize edit distance (computed scoring)"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Stop after this many reads (0 = no limit)"),
        )
        .arg(
            Arg::new("special")
                .long("special")
                .num_args(1)
                .default_value("ERCC")
                .help("Reference names containing this are spike-in controls"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .short('s')
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help("Random seed for breaking ties; default uses OS entropy"),
        )
        .arg(
            Arg::new("keep")
                .long("keep")
                .num_args(1)
                .help("Write the names and labels of accepted reads here"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .num_args(1)
                .help("Write parameters and stats to a log file instead of stderr"),
        )
        .arg(
            Arg::new("sam")
                .long("sam")
                .action(ArgAction::SetTrue)
                .help("Inputs are SAM text (plain or .gz) instead of BAM"),
        )
        .arg(
            Arg::new("samtools")
                .long("samtools")
                .num_args(1)
                .default_value("samtools")
                .help("The samtools executable used to decode inputs"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let started = Instant::now();

    //----------------------------
    // Args
    //----------------------------
    let infiles: Vec<String> = args
        .get_many::<String>("infiles")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    let labels: Vec<String> = args
        .get_one::<String>("labels")
        .map(|s| s.split(',').map(|l| l.to_string()).collect())
        .unwrap_or_default();

    let opt_penalty = *args.get_one::<f64>("edit_penalty").unwrap();
    let scoring = match args.get_one::<String>("scoring").unwrap().as_str() {
        "computed" => Scoring::Computed {
            penalty: opt_penalty,
        },
        _ => Scoring::Tag,
    };
    let min_metric = match scoring {
        Scoring::Tag => *args.get_one::<i64>("min_score").unwrap(),
        Scoring::Computed { .. } => *args.get_one::<i64>("min_len").unwrap(),
    };
    let thresholds = Thresholds {
        min_metric,
        max_dist: *args.get_one::<i64>("max_dist").unwrap(),
        special: args.get_one::<String>("special").unwrap().to_string(),
    };
    let opt_limit = *args.get_one::<u64>("limit").unwrap();
    let opt_seed = args.get_one::<u64>("seed").copied();
    let opt_keep = args.get_one::<String>("keep");
    let is_sam = args.get_flag("sam");
    let samtools = args.get_one::<String>("samtools").unwrap();

    let opt_log = args.get_one::<String>("log");
    let mut log: Box<dyn Write> = match opt_log {
        Some(path) => bestbam::writer(path)?,
        None => Box::new(std::io::stderr()),
    };

    if labels.iter().any(|l| l.is_empty()) {
        return Err(HitError::Config("must specify --labels lab1,lab2".to_string()).into());
    }
    if thresholds.special.is_empty() {
        return Err(HitError::Config("--special must not be empty".to_string()).into());
    }
    if labels.len() != infiles.len() {
        return Err(HitError::Config(format!(
            "{} labels given for {} input files",
            labels.len(),
            infiles.len()
        ))
        .into());
    }

    writeln!(
        log,
        "command: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    )?;
    writeln!(log, "==> Args")?;
    writeln!(log, "    infiles = {:?}", infiles)?;
    writeln!(log, "    labels = {:?}", labels)?;
    writeln!(log, "    scoring = {}", scoring.name())?;
    match scoring {
        Scoring::Tag => writeln!(log, "    min-score = {}", thresholds.min_metric)?,
        Scoring::Computed { penalty } => {
            writeln!(log, "    min-len = {}", thresholds.min_metric)?;
            writeln!(log, "    edit-penalty = {}", penalty)?;
        }
    }
    writeln!(log, "    max-dist = {}", thresholds.max_dist)?;
    writeln!(log, "    limit = {}", opt_limit)?;
    writeln!(log, "    special = {}", thresholds.special)?;
    match opt_seed {
        Some(seed) => writeln!(log, "    seed = {}", seed)?,
        None => writeln!(log, "    seed = (entropy)")?,
    }
    if let Some(keep) = opt_keep {
        writeln!(log, "    keep = {}", keep)?;
    }

    //----------------------------
    // Ops
    //----------------------------
    let scanners = super::open_scanners(&infiles, &labels, is_sam, samtools)?;
    let keep = match opt_keep {
        Some(path) => Some(bestbam::writer(path)?),
        None => None,
    };
    let rng = match opt_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut merge = MergeCoordinator::new(scanners);
    let mut picker = RandomPicker(rng);
    let mut acc = Accumulator::new(scoring, thresholds, labels.clone(), keep);

    let result = (|| -> anyhow::Result<()> {
        loop {
            let reads = acc.stats().reads;
            if reads > 0 && reads % 100_000 == 0 {
                writeln!(log, "found {} reads so far", reads)?;
            }
            if opt_limit > 0 && reads == opt_limit {
                return Ok(());
            }

            let group = match merge.next_group()? {
                Some(group) => group,
                None => return Ok(()),
            };
            let selection = select_best(&group, &scoring, &mut picker)
                .ok_or_else(|| HitError::Invariant(format!("no hits for {}", group.read)))?;
            acc.record(&group, &selection)?;
        }
    })();
    writeln!(log, "processing took {:?}", started.elapsed())?;
    if let Err(err) = result {
        // stderr already gets the error from main
        if opt_log.is_some() {
            writeln!(log, "{}", err)?;
        }
        log.flush()?;
        return Err(err);
    }

    // stops decoders of streams left undrained by --limit
    drop(merge);

    let stats = acc.finish()?;
    write_report(&stats, &scoring, &labels, &mut log)?;
    log.flush()?;

    Ok(())
}
