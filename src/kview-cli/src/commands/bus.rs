//! Bus device and driver dumps

use anyhow::{Context, Result};
use kview::bus::{device_name, driver_name};
use kview::{
    find_bus_device, find_bus_driver, for_each_bus_device, for_each_bus_driver, format_object, to_bus_device,
    to_bus_driver, BusKind, Program,
};

/// List the devices on `bus`, or dump the named one
pub fn devices(
    prog: &Program,
    bus: BusKind,
    name: Option<&str>,
    drvdata: Option<&str>,
) -> Result<()> {
    let Some(name) = name else {
        for device in for_each_bus_device(prog, bus)? {
            println!("{}", device_name(&device)?);
        }
        return Ok(());
    };

    let device = find_bus_device(prog, bus, name)?;
    println!("=== {} ===", name);
    println!("{}", format_object(&device)?);
    println!("{}", format_object(&to_bus_device(&device, bus)?)?);

    if let Some(ty) = drvdata {
        let data = device
            .member("driver_data")?
            .pointer_as(ty)
            .with_context(|| format!("driver_data of {} as {}", name, ty))?;
        println!("{}", format_object(&data)?);
    }

    Ok(())
}

/// Dump every driver on `bus` (or only `name`), generic and bus-specific
pub fn drivers(prog: &Program, bus: BusKind, name: Option<&str>) -> Result<()> {
    let drivers = match name {
        Some(name) => vec![find_bus_driver(prog, bus, name)?],
        None => for_each_bus_driver(prog, bus)?,
    };

    for driver in drivers {
        println!("=== {} ===", driver_name(&driver)?);
        println!("{}", format_object(&driver)?);
        println!("{}", format_object(&to_bus_driver(&driver, bus)?)?);
    }
    Ok(())
}
