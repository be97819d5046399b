extern crate clap;
use clap::*;

mod cmd_bestbam;

fn main() -> anyhow::Result<()> {
    let app = Command::new("bestbam")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`bestbam` - Best hits of reads mapped against several genomes")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_bestbam::hit::make_subcommand())
        .subcommand(cmd_bestbam::check::make_subcommand())
        .after_help(
            r###"Subcommands:

* hit   - Pick the best hit of every read and count the decisions
* check - Verify that alignment files are sorted by read name

All inputs must be sorted by read name (`samtools sort -n`).

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("hit", sub_matches)) => cmd_bestbam::hit::execute(sub_matches),
        Some(("check", sub_matches)) => cmd_bestbam::check::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
