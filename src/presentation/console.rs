use colored::*;

use super::describe_route;
use crate::domain::registry::PubRegistry;
use crate::domain::types::CrawlPlan;

pub fn print_plan(title: &str, plan: &CrawlPlan) {
    println!("{}", title.bold());
    println!(
        "{}",
        format_args!("Route distance: {:.1} meters", plan.total_distance)
            .to_string()
            .green()
    );
    println!("Route: {}", describe_route(&plan.stops));
    for (i, stop) in plan.stops.iter().enumerate() {
        println!("  {:>2}: {}", i, stop.name);
    }
}

pub fn print_comparison(initial: &CrawlPlan, optimized: &CrawlPlan) {
    let saved = initial.total_distance - optimized.total_distance;
    if saved > 0.0 {
        println!(
            "{}",
            format!(
                "Optimizing saves {:.1} meters over the unordered route ({:.1} m)",
                saved, initial.total_distance
            )
            .cyan()
        );
    } else {
        println!(
            "The unordered route ({:.1} m) is already as short",
            initial.total_distance
        );
    }
}

pub fn print_registry(registry: &PubRegistry) {
    println!("{}", format!("{} pubs", registry.len()).bold());
    for loc in registry.locations() {
        let address = if loc.address.is_empty() {
            String::new()
        } else {
            format!(" - {}", loc.address).dimmed().to_string()
        };
        println!(
            "  {} ({:.5}, {:.5}){}",
            loc.name, loc.latitude, loc.longitude, address
        );
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
