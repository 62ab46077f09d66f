//! Bus device and driver lookups
//!
//! Each registered bus has a `struct subsys_private` on `bus_kset->list`.
//! Its devices hang off `klist_devices` and its drivers off
//! `drivers_kset->list`; both lists hold the generic `struct device` /
//! `struct device_driver`, which [`to_bus_device`] and [`to_bus_driver`]
//! widen to the bus-specific structure.

use crate::error::{KernelError, Result};
use crate::helpers::list_for_each_entry;
use crate::object::Object;
use crate::program::Program;
use crate::release::KernelRelease;

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusKind {
    Platform,
    Usb,
    Pci,
}

impl BusKind {
    pub const ALL: [BusKind; 3] = [BusKind::Platform, BusKind::Usb, BusKind::Pci];

    /// `bus_type.name` as registered by the kernel
    pub fn name(self) -> &'static str {
        match self {
            BusKind::Platform => "platform",
            BusKind::Usb => "usb",
            BusKind::Pci => "pci",
        }
    }

    pub fn device_type(self) -> &'static str {
        match self {
            BusKind::Platform => "struct platform_device",
            BusKind::Usb => "struct usb_device",
            BusKind::Pci => "struct pci_dev",
        }
    }

    pub fn driver_type(self) -> &'static str {
        match self {
            BusKind::Platform => "struct platform_driver",
            BusKind::Usb => "struct usb_driver",
            BusKind::Pci => "struct pci_driver",
        }
    }

    /// Member of the bus-specific device embedding its `struct device`
    pub fn device_member(self) -> &'static str {
        "dev"
    }

    /// Member of the bus-specific driver embedding its `struct device_driver`
    ///
    /// 6.8 dropped `struct usbdrv_wrap` from `struct usb_driver`.
    pub fn driver_member(self, release: KernelRelease) -> &'static str {
        match self {
            BusKind::Usb if !release.at_least(6, 8) => "drvwrap.driver",
            _ => "driver",
        }
    }
}

impl FromStr for BusKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        BusKind::ALL
            .into_iter()
            .find(|bus| bus.name() == s)
            .ok_or_else(|| KernelError::UnknownBus(s.to_string()))
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A device named as `<name>@<bus>`, e.g. `0000:00:1f.2@pci`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    pub name: String,
    pub bus: BusKind,
}

impl FromStr for DeviceSelector {
    type Err = KernelError;

    /// Splits at the last `@`, so device names may themselves contain one
    fn from_str(s: &str) -> Result<Self> {
        let (name, bus) = s
            .rsplit_once('@')
            .ok_or_else(|| KernelError::InvalidSelector(s.to_string()))?;
        if name.is_empty() {
            return Err(KernelError::InvalidSelector(s.to_string()));
        }
        Ok(DeviceSelector {
            name: name.to_string(),
            bus: bus.parse()?,
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.bus)
    }
}

/// The `struct subsys_private` of a bus
pub fn bus_to_subsys(prog: &Program, bus: BusKind) -> Result<Object<'_>> {
    let bus_kset = prog.pointer_variable("bus_kset", "struct kset")?;
    let list = bus_kset.member("list")?;

    for sp in list_for_each_entry(&list, "struct subsys_private", "subsys.kobj.entry")? {
        let sp = sp?;
        let name = match sp.member("bus").and_then(|b| b.member("name")?.read_cstr()) {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(
                    address = format_args!("{:#x}", sp.address()),
                    "skipping subsystem: {}",
                    e
                );
                continue;
            }
        };
        if name == bus.name() {
            return Ok(sp);
        }
    }

    Err(KernelError::BusNotFound(bus.name().to_string()))
}

/// Every `struct device` on a bus, in registration order
pub fn for_each_bus_device(prog: &Program, bus: BusKind) -> Result<Vec<Object<'_>>> {
    let sp = bus_to_subsys(prog, bus)?;
    let head = sp.member("klist_devices")?.member("k_list")?;

    list_for_each_entry(&head, "struct device_private", "knode_bus.n_node")?
        .map(|private| private?.member("device")?.deref())
        .collect()
}

/// `dev_name()`: the device's kobject name
pub fn device_name(device: &Object<'_>) -> Result<String> {
    device.member("kobj")?.member("name")?.read_cstr()
}

pub fn find_bus_device<'p>(prog: &'p Program, bus: BusKind, name: &str) -> Result<Object<'p>> {
    for device in for_each_bus_device(prog, bus)? {
        if device_name(&device)? == name {
            return Ok(device);
        }
    }
    Err(KernelError::DeviceNotFound {
        bus: bus.name().to_string(),
        name: name.to_string(),
    })
}

/// `to_platform_device()` and friends
pub fn to_bus_device<'p>(device: &Object<'p>, bus: BusKind) -> Result<Object<'p>> {
    device.container_of(bus.device_type(), bus.device_member())
}

/// Every `struct device_driver` on a bus
pub fn for_each_bus_driver(prog: &Program, bus: BusKind) -> Result<Vec<Object<'_>>> {
    let sp = bus_to_subsys(prog, bus)?;
    let head = sp.member("drivers_kset")?.member("list")?;

    list_for_each_entry(&head, "struct driver_private", "kobj.entry")?
        .map(|private| private?.member("driver")?.deref())
        .collect()
}

pub fn driver_name(driver: &Object<'_>) -> Result<String> {
    driver.member("name")?.read_cstr()
}

pub fn find_bus_driver<'p>(prog: &'p Program, bus: BusKind, name: &str) -> Result<Object<'p>> {
    for driver in for_each_bus_driver(prog, bus)? {
        if driver_name(&driver)? == name {
            return Ok(driver);
        }
    }
    Err(KernelError::DriverNotFound {
        bus: bus.name().to_string(),
        name: name.to_string(),
    })
}

/// `to_platform_driver()` and friends
pub fn to_bus_driver<'p>(driver: &Object<'p>, bus: BusKind) -> Result<Object<'p>> {
    let release = driver.program().release();
    driver.container_of(bus.driver_type(), bus.driver_member(release))
}
