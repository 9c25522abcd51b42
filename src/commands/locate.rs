use anyhow::{anyhow, Result};
use geo::Coord;

use urbanicity::{HexId, Resolution};

use crate::cli::{Cli, LocateArgs};

pub fn run(cli: &Cli, args: &LocateArgs) -> Result<()> {
    let res = Resolution::try_from(args.res)?;
    let point = Coord { x: args.x, y: args.y };
    let id = HexId::from_coord(point, res)
        .ok_or_else(|| anyhow!("No cell at res {res} for ({}, {})", args.x, args.y))?;

    let center = id.center();
    println!("hex_id   {id}");
    println!("res      {res}");
    println!("center   {:.3} {:.3}", center.x, center.y);
    println!("area_km2 {:.6}", id.area_m2() / 1e6);
    if let Some(parent) = res.coarser().and_then(|coarser| id.parent(coarser)) {
        println!("parent   {parent}");
    }
    if cli.verbose > 0 {
        for neighbor in id.neighbors() {
            println!("neighbor {neighbor}");
        }
    }
    Ok(())
}
