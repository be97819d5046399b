use bestbam::libs::scanner::StreamScanner;
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("check")
        .about("Checks that alignment files are sorted by read name")
        .after_help(
            r###"
Streams every input and verifies that read names never decrease in natural
order, the order of `samtools sort -n`. Every record is also parsed.

Output, one line per input:
    file<TAB>records<TAB>reads<TAB>ok

The first malformed or out-of-order record stops the command with an error
naming the file and line.

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input alignment file(s) to check"),
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
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = bestbam::writer(args.get_one::<String>("outfile").unwrap())?;
    let infiles: Vec<String> = args
        .get_many::<String>("infiles")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    let is_sam = args.get_flag("sam");
    let samtools = args.get_one::<String>("samtools").unwrap();

    //----------------------------
    // Ops
    //----------------------------
    let scanners = super::open_scanners(&infiles, &infiles, is_sam, samtools)?;
    for (infile, mut scanner) in infiles.iter().zip(scanners) {
        let (records, reads) = count_stream(&mut scanner)?;
        writer.write_all(format!("{}\t{}\t{}\tok\n", infile, records, reads).as_ref())?;
    }
    writer.flush()?;

    Ok(())
}

fn count_stream(scanner: &mut StreamScanner) -> anyhow::Result<(usize, usize)> {
    let mut records = 0;
    let mut reads = 0;
    let mut prev: Option<String> = None;
    while let Some(record) = scanner.next_record()? {
        records += 1;
        if prev.as_deref() != Some(record.qname.as_str()) {
            reads += 1;
            prev = Some(record.qname);
        }
    }
    Ok((records, reads))
}
