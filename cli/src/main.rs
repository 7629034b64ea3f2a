//! Command-line tools for generating street meshes from a road graph stored as JSON.

#[macro_use]
extern crate log;

mod build;
mod to_geojson;

use anyhow::Result;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "street_mesh", about = "Generates 3D street geometry from a road graph")]
enum Command {
    /// Meshes a road graph and writes every triangle list, the waypoint graphs, Steiner points,
    /// and model instances as JSON
    Build {
        /// The path to a road graph in JSON
        #[structopt(long)]
        graph: String,
        /// The path to a JSON config. Anything missing uses the default.
        #[structopt(long)]
        config: Option<String>,
        /// The path to a height grid in JSON. Without one, heights stay as offsets from the
        /// ground.
        #[structopt(long)]
        heights: Option<String>,
        /// The path to write the results
        #[structopt(long)]
        output: String,
    },
    /// Meshes a road graph and writes the triangles and waypoint edges as GeoJSON, for viewing
    /// in a normal map tool. Heights are dropped.
    #[structopt(name = "geojson")]
    GeoJSON {
        /// The path to a road graph in JSON
        #[structopt(long)]
        graph: String,
        /// The path to a JSON config. Anything missing uses the default.
        #[structopt(long)]
        config: Option<String>,
        /// The path to write the GeoJSON
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::Build {
            graph,
            config,
            heights,
            output,
        } => build::run(graph, config, heights, output)?,
        Command::GeoJSON {
            graph,
            config,
            output,
        } => to_geojson::run(graph, config, output)?,
    }
    Ok(())
}
