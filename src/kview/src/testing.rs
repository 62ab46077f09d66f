//! Synthetic kernel image for unit tests
//!
//! Builds a small type table and a memory image holding four tasks, the
//! platform, pci and usb bus subsystems, and a handful of irq descriptors
//! reachable through a maple tree, an XArray or a flat array.

use crate::bus::BusKind;
use crate::program::Program;
use crate::release::KernelRelease;
use crate::source::MockMemorySource;
use crate::symbols::SymbolTable;
use crate::types::{Aggregate, Member, Qualifier, TypeId, TypeKind, TypeTable};

pub(crate) const BASE: u64 = 0xffff_8880_0100_0000;
const IMAGE_SIZE: usize = 0x40000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IrqLayout {
    Maple,
    Xarray,
    /// `irq_desc[32]` bounded by `nr_irqs`
    Flat,
    /// No `nr_irqs` symbol; BTF declares `irq_desc[32]`
    FlatUncounted,
    /// Neither `nr_irqs` nor a declared length
    FlatUnbounded,
}

impl IrqLayout {
    fn is_flat(self) -> bool {
        matches!(
            self,
            IrqLayout::Flat | IrqLayout::FlatUncounted | IrqLayout::FlatUnbounded
        )
    }
}

pub(crate) struct Fixture {
    program: Program,
    image: Vec<u8>,
    types: TypeTable,
    symbols: SymbolTable,
    release: KernelRelease,
    /// init_task, systemd (1), dbus-daemon (300), its thread gdbus (301)
    pub tasks: Vec<u64>,
    pub signals: Vec<u64>,
    /// (bus, name, address of the bus-specific structure)
    pub devices: Vec<(BusKind, &'static str, u64)>,
    pub drivers: Vec<(BusKind, &'static str, u64)>,
    pub irq_descs: Vec<(u32, u64)>,
    /// `dev.driver_data` of serial8250, a `struct irq_data`
    pub drvdata: u64,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::build(KernelRelease::new(6, 9, 0), IrqLayout::Maple)
    }

    pub(crate) fn with_irqs(layout: IrqLayout) -> Self {
        Self::build(KernelRelease::new(6, 9, 0), layout)
    }

    pub(crate) fn with_release(release: KernelRelease) -> Self {
        Self::build(release, IrqLayout::Maple)
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Fresh writable copy of the image
    pub(crate) fn memory(&self) -> MockMemorySource {
        MockMemorySource::new(self.image.clone(), BASE)
    }

    /// Program over a modified copy of the image
    pub(crate) fn program_with(&self, memory: MockMemorySource) -> Program {
        Program::new(
            Box::new(memory),
            self.symbols.clone(),
            self.types.clone(),
            self.release,
        )
    }

    pub(crate) fn irq_desc(&self, irq: u32) -> Option<u64> {
        self.irq_descs
            .iter()
            .find(|(n, _)| *n == irq)
            .map(|(_, desc)| *desc)
    }

    pub(crate) fn device(&self, name: &str) -> Option<u64> {
        self.devices
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(_, _, addr)| *addr)
    }

    pub(crate) fn driver(&self, name: &str) -> Option<u64> {
        self.drivers
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(_, _, addr)| *addr)
    }

    fn build(release: KernelRelease, irqs: IrqLayout) -> Self {
        let mut types = kernel_types(release);
        if matches!(irqs, IrqLayout::Flat | IrqLayout::FlatUncounted) {
            let desc = types.find("struct irq_desc").unwrap();
            let array = types.add(TypeKind::Array {
                element: desc,
                len: 32,
            });
            types.add(TypeKind::Variable {
                name: "irq_desc".to_string(),
                target: array,
            });
        }
        let mut b = Builder {
            mem: MockMemorySource::zeroed(IMAGE_SIZE, BASE),
            next: BASE,
            symbols: SymbolTable::new(),
        };

        let (tasks, signals) = b.tasks();
        let (devices, drivers, drvdata) = b.buses(release);
        let irq_descs = b.irqs(irqs);

        let image = b.mem.data.clone();
        let program = Program::new(
            Box::new(b.mem),
            b.symbols.clone(),
            types.clone(),
            release,
        );

        Fixture {
            program,
            image,
            types,
            symbols: b.symbols,
            release,
            tasks,
            signals,
            devices,
            drivers,
            irq_descs,
            drvdata,
        }
    }
}

struct Types {
    table: TypeTable,
}

impl Types {
    fn next_id(&self) -> TypeId {
        self.table.len() as TypeId
    }

    fn int(&mut self, name: &str, size: u64, signed: bool) -> TypeId {
        self.table.add(TypeKind::Int {
            name: name.to_string(),
            size,
            signed,
            is_char: name == "char",
            is_bool: name == "_Bool",
        })
    }

    fn ptr(&mut self, target: TypeId) -> TypeId {
        self.table.add(TypeKind::Pointer { target })
    }

    fn array(&mut self, element: TypeId, len: u64) -> TypeId {
        self.table.add(TypeKind::Array { element, len })
    }

    fn typedef(&mut self, name: &str, target: TypeId) -> TypeId {
        self.table.add(TypeKind::Typedef {
            name: name.to_string(),
            target,
        })
    }

    fn aggregate(name: &str, size: u64, members: &[(&str, TypeId, u64)]) -> Aggregate {
        Aggregate {
            name: (!name.is_empty()).then(|| name.to_string()),
            size,
            members: members
                .iter()
                .map(|(name, ty, offset)| Member {
                    name: (!name.is_empty()).then(|| name.to_string()),
                    ty: *ty,
                    bit_offset: offset * 8,
                    bitfield_size: 0,
                })
                .collect(),
        }
    }

    fn strukt(&mut self, name: &str, size: u64, members: &[(&str, TypeId, u64)]) -> TypeId {
        self.table
            .add(TypeKind::Struct(Self::aggregate(name, size, members)))
    }

    fn union(&mut self, name: &str, size: u64, members: &[(&str, TypeId, u64)]) -> TypeId {
        self.table
            .add(TypeKind::Union(Self::aggregate(name, size, members)))
    }
}

fn kernel_types(release: KernelRelease) -> TypeTable {
    let mut t = Types {
        table: TypeTable::new(),
    };

    let int = t.int("int", 4, true);
    let uint = t.int("unsigned int", 4, false);
    let ulong = t.int("unsigned long", 8, false);
    let uchar = t.int("unsigned char", 1, false);
    let char_ = t.int("char", 1, true);
    let bool_ = t.int("_Bool", 1, false);
    let pid_t = t.typedef("pid_t", int);
    let u64_ = t.typedef("u64", ulong);
    let void_ptr = t.ptr(0);
    let const_char = t.table.add(TypeKind::Qualified {
        qualifier: Qualifier::Const,
        target: char_,
    });
    let const_char_ptr = t.ptr(const_char);
    let comm = t.array(char_, 16);
    let func = t.table.add(TypeKind::Function { name: None });
    let func_ptr = t.ptr(func);

    let list_head = t.next_id();
    t.strukt(
        "list_head",
        0x10,
        &[("next", list_head + 1, 0), ("prev", list_head + 1, 8)],
    );
    t.ptr(list_head);

    // Tasks
    let signal = t.strukt(
        "signal_struct",
        0x18,
        &[("thread_head", list_head, 0), ("nr_threads", int, 0x10)],
    );
    let signal_ptr = t.ptr(signal);
    let se = t.strukt(
        "sched_entity",
        0x10,
        &[("vruntime", u64_, 0), ("on_rq", uint, 8)],
    );
    let task = t.next_id();
    let mut task_struct = Types::aggregate(
        "task_struct",
        0x60,
        &[
            ("__state", uint, 0),
            ("prio", int, 4),
            ("pid", pid_t, 0x0c),
            ("tasks", list_head, 0x10),
            ("thread_node", list_head, 0x20),
            ("se", se, 0x30),
            ("comm", comm, 0x40),
            ("signal", signal_ptr, 0x50),
            ("parent", task + 1, 0x58),
        ],
    );
    for (bit, name) in [(64, "in_iowait"), (65, "in_execve")] {
        task_struct.members.insert(
            2 + (bit - 64) as usize,
            Member {
                name: Some(name.to_string()),
                ty: uint,
                bit_offset: bit,
                bitfield_size: 1,
            },
        );
    }
    t.table.add(TypeKind::Struct(task_struct));
    t.ptr(task);

    // Driver core
    let kobject = t.strukt(
        "kobject",
        0x18,
        &[("name", const_char_ptr, 0), ("entry", list_head, 8)],
    );
    let kset = t.strukt("kset", 0x28, &[("list", list_head, 0), ("kobj", kobject, 0x10)]);
    let kset_ptr = t.ptr(kset);
    let klist = t.strukt("klist", 0x10, &[("k_list", list_head, 0)]);
    let klist_node = t.strukt(
        "klist_node",
        0x18,
        &[("n_klist", void_ptr, 0), ("n_node", list_head, 8)],
    );
    let bus_type = t.strukt("bus_type", 0x08, &[("name", const_char_ptr, 0)]);
    let bus_type_ptr = t.ptr(bus_type);
    t.strukt(
        "subsys_private",
        0x48,
        &[
            ("subsys", kset, 0),
            ("drivers_kset", kset_ptr, 0x28),
            ("klist_devices", klist, 0x30),
            ("bus", bus_type_ptr, 0x40),
        ],
    );
    let device = t.strukt(
        "device",
        0x28,
        &[
            ("kobj", kobject, 0),
            ("driver_data", void_ptr, 0x18),
            ("bus", bus_type_ptr, 0x20),
        ],
    );
    let device_ptr = t.ptr(device);
    t.strukt(
        "device_private",
        0x20,
        &[("knode_bus", klist_node, 0), ("device", device_ptr, 0x18)],
    );
    let probe_type = t.table.add(TypeKind::Enum {
        name: Some("probe_type".to_string()),
        size: 4,
        signed: false,
        variants: vec![
            ("PROBE_DEFAULT_STRATEGY".to_string(), 0),
            ("PROBE_PREFER_ASYNCHRONOUS".to_string(), 1),
            ("PROBE_FORCE_SYNCHRONOUS".to_string(), 2),
        ],
    });
    let device_driver = t.strukt(
        "device_driver",
        0x18,
        &[
            ("name", const_char_ptr, 0),
            ("bus", bus_type_ptr, 8),
            ("probe_type", probe_type, 0x10),
        ],
    );
    let device_driver_ptr = t.ptr(device_driver);
    t.strukt(
        "driver_private",
        0x20,
        &[("kobj", kobject, 0), ("driver", device_driver_ptr, 0x18)],
    );
    t.strukt(
        "platform_device",
        0x38,
        &[("name", const_char_ptr, 0), ("id", int, 8), ("dev", device, 0x10)],
    );
    t.strukt(
        "pci_dev",
        0x30,
        &[("devfn", uint, 0), ("vendor", uint, 4), ("dev", device, 8)],
    );
    t.strukt("usb_device", 0x30, &[("devnum", int, 0), ("dev", device, 8)]);
    t.strukt(
        "platform_driver",
        0x20,
        &[("probe", func_ptr, 0), ("driver", device_driver, 8)],
    );
    t.strukt(
        "pci_driver",
        0x20,
        &[("name", const_char_ptr, 0), ("driver", device_driver, 8)],
    );
    if release.at_least(6, 8) {
        t.strukt(
            "usb_driver",
            0x20,
            &[("name", const_char_ptr, 0), ("driver", device_driver, 8)],
        );
    } else {
        let wrap = t.strukt(
            "usbdrv_wrap",
            0x20,
            &[("for_devices", int, 0), ("driver", device_driver, 8)],
        );
        t.strukt(
            "usb_driver",
            0x28,
            &[("name", const_char_ptr, 0), ("drvwrap", wrap, 8)],
        );
    }

    // Interrupts
    let irq_data = t.strukt(
        "irq_data",
        0x10,
        &[("irq", uint, 0), ("hwirq", ulong, 8)],
    );
    t.strukt(
        "irq_desc",
        0x28,
        &[
            ("irq_data", irq_data, 0),
            ("status_use_accessors", uint, 0x10),
            ("depth", uint, 0x14),
            ("name", const_char_ptr, 0x18),
            ("no_suspend", bool_, 0x20),
        ],
    );
    let xa_slots = t.array(void_ptr, 64);
    t.strukt(
        "xa_node",
        0x218,
        &[
            ("shift", uchar, 0),
            ("offset", uchar, 1),
            ("count", uchar, 2),
            ("parent", void_ptr, 8),
            ("array", void_ptr, 0x10),
            ("slots", xa_slots, 0x18),
        ],
    );
    t.strukt(
        "xarray",
        0x10,
        &[("xa_lock", uint, 0), ("xa_flags", uint, 4), ("xa_head", void_ptr, 8)],
    );
    let pivot15 = t.array(ulong, 15);
    let slot16 = t.array(void_ptr, 16);
    let pivot9 = t.array(ulong, 9);
    let slot10 = t.array(void_ptr, 10);
    let gap10 = t.array(ulong, 10);
    let slot31 = t.array(void_ptr, 31);
    let mr64 = t.strukt(
        "maple_range_64",
        0x100,
        &[("parent", void_ptr, 0), ("pivot", pivot15, 8), ("slot", slot16, 0x80)],
    );
    let ma64 = t.strukt(
        "maple_arange_64",
        0x100,
        &[
            ("parent", void_ptr, 0),
            ("pivot", pivot9, 8),
            ("slot", slot10, 0x50),
            ("gap", gap10, 0xa0),
        ],
    );
    let dense = t.strukt("", 0x100, &[("parent", void_ptr, 0), ("slot", slot31, 8)]);
    let node_union = t.union("", 0x100, &[("", dense, 0), ("mr64", mr64, 0), ("ma64", ma64, 0)]);
    t.strukt("maple_node", 0x100, &[("", node_union, 0)]);
    t.strukt(
        "maple_tree",
        0x10,
        &[("ma_lock", uint, 0), ("ma_flags", uint, 4), ("ma_root", void_ptr, 8)],
    );

    t.table
}

struct Builder {
    mem: MockMemorySource,
    next: u64,
    symbols: SymbolTable,
}

impl Builder {
    /// 256-byte aligned allocation, which maple nodes require
    fn alloc(&mut self, size: u64) -> u64 {
        let address = self.next;
        self.next += (size + 0xff) & !0xff;
        assert!(self.next <= BASE + IMAGE_SIZE as u64, "fixture image full");
        address
    }

    fn string(&mut self, s: &str) -> u64 {
        let address = self.alloc(s.len() as u64 + 1);
        self.mem.write_bytes(address, s.as_bytes());
        address
    }

    fn symbol(&mut self, name: &str, address: u64) {
        self.symbols.add(name, address);
    }

    /// Make `head` and `nodes` one circular list
    fn link(&mut self, head: u64, nodes: &[u64]) {
        let all: Vec<u64> = std::iter::once(head).chain(nodes.iter().copied()).collect();
        let n = all.len();
        for i in 0..n {
            self.mem.write_u64(all[i], all[(i + 1) % n]);
            self.mem.write_u64(all[i] + 8, all[(i + n - 1) % n]);
        }
    }

    fn tasks(&mut self) -> (Vec<u64>, Vec<u64>) {
        let signals: Vec<u64> = (0..3).map(|_| self.alloc(0x18)).collect();
        let specs: [(i32, &str, i32, usize, u64); 4] = [
            (0, "swapper/0", -20, 0, 0),
            (1, "systemd", 120, 1, 0),
            (300, "dbus-daemon", 120, 2, 1),
            (301, "gdbus", 120, 2, 1),
        ];

        let mut tasks = Vec::new();
        for (pid, comm, prio, signal, _) in specs {
            let task = self.alloc(0x60);
            self.mem.write_u32(task + 0x04, prio as u32);
            self.mem.write_u32(task + 0x0c, pid as u32);
            self.mem.write_bytes(task + 0x40, comm.as_bytes());
            self.mem.write_u64(task + 0x50, signals[signal]);
            tasks.push(task);
        }
        for (task, (.., parent)) in tasks.iter().zip(specs) {
            if *task != tasks[0] {
                self.mem.write_u64(task + 0x58, tasks[parent as usize]);
            }
        }

        // systemd is waiting on I/O and queued
        self.mem.write_bytes(tasks[1] + 0x08, &[0x01]);
        self.mem.write_u64(tasks[1] + 0x30, 123_456);
        self.mem.write_u32(tasks[1] + 0x38, 1);

        self.link(tasks[0] + 0x10, &[tasks[1] + 0x10, tasks[2] + 0x10]);
        self.link(tasks[3] + 0x10, &[]);
        self.link(signals[0], &[tasks[0] + 0x20]);
        self.link(signals[1], &[tasks[1] + 0x20]);
        self.link(signals[2], &[tasks[2] + 0x20, tasks[3] + 0x20]);
        for (signal, threads) in signals.iter().zip([1u32, 1, 2]) {
            self.mem.write_u32(signal + 0x10, threads);
        }

        self.symbol("init_task", tasks[0]);
        (tasks, signals)
    }

    fn kobject(&mut self, address: u64, name: &str) {
        let name = self.string(name);
        self.mem.write_u64(address, name);
    }

    /// A bus subsystem with its devices and drivers; returns the device
    /// and driver addresses
    fn bus(
        &mut self,
        bus: BusKind,
        devices: &[(&'static str, u64)],
        drivers: &[(&'static str, u64)],
        release: KernelRelease,
    ) -> (u64, Vec<u64>, Vec<u64>) {
        let bus_type = self.alloc(0x08);
        let name = self.string(bus.name());
        self.mem.write_u64(bus_type, name);
        self.symbol(&format!("{}_bus_type", bus.name()), bus_type);

        let sp = self.alloc(0x48);
        self.kobject(sp + 0x10, bus.name());
        let drivers_kset = self.alloc(0x28);
        self.kobject(drivers_kset + 0x10, "drivers");
        self.mem.write_u64(sp + 0x28, drivers_kset);
        self.mem.write_u64(sp + 0x40, bus_type);

        let (dev_size, dev_offset) = match bus {
            BusKind::Platform => (0x38, 0x10),
            BusKind::Pci => (0x30, 0x08),
            BusKind::Usb => (0x30, 0x08),
        };
        let mut dev_addrs = Vec::new();
        let mut nodes = Vec::new();
        for (name, word) in devices {
            let outer = self.alloc(dev_size);
            self.mem.write_u64(outer, *word);
            let dev = outer + dev_offset;
            self.kobject(dev, name);
            self.mem.write_u64(dev + 0x20, bus_type);

            let private = self.alloc(0x20);
            self.mem.write_u64(private + 0x18, dev);
            nodes.push(private + 0x08);
            dev_addrs.push(outer);
        }
        self.link(sp + 0x30, &nodes);

        let drv_offset = match bus {
            BusKind::Usb if !release.at_least(6, 8) => 0x10,
            _ => 0x08,
        };
        let mut drv_addrs = Vec::new();
        let mut entries = Vec::new();
        for (name, probe_type) in drivers {
            let outer = self.alloc(0x28);
            let drv = outer + drv_offset;
            let name_str = self.string(name);
            self.mem.write_u64(drv, name_str);
            self.mem.write_u64(drv + 0x08, bus_type);
            self.mem.write_u32(drv + 0x10, *probe_type as u32);
            if bus != BusKind::Platform {
                self.mem.write_u64(outer, name_str);
            }

            let private = self.alloc(0x20);
            self.kobject(private, name);
            self.mem.write_u64(private + 0x18, drv);
            entries.push(private + 0x08);
            drv_addrs.push(outer);
        }
        self.link(drivers_kset, &entries);

        (sp, dev_addrs, drv_addrs)
    }

    #[allow(clippy::type_complexity)]
    fn buses(
        &mut self,
        release: KernelRelease,
    ) -> (
        Vec<(BusKind, &'static str, u64)>,
        Vec<(BusKind, &'static str, u64)>,
        u64,
    ) {
        let kset = self.alloc(0x28);
        self.kobject(kset + 0x10, "bus");
        let kset_slot = self.alloc(0x08);
        self.mem.write_u64(kset_slot, kset);
        self.symbol("bus_kset", kset_slot);

        let layout: [(BusKind, Vec<(&'static str, u64)>, Vec<(&'static str, u64)>); 3] = [
            (
                BusKind::Platform,
                vec![("serial8250", 0), ("reg-dummy", 0)],
                vec![("serial8250", 1), ("alarmtimer", 0)],
            ),
            (
                BusKind::Pci,
                vec![
                    ("0000:00:1f.2", 0x8086_0000_00fa),
                    ("0000:00:02.0", 0x8086_0000_0010),
                ],
                vec![("ahci", 0)],
            ),
            (BusKind::Usb, vec![], vec![("usbfs", 0)]),
        ];

        let mut devices = Vec::new();
        let mut drivers = Vec::new();
        let mut subsystems = Vec::new();
        for (bus, devs, drvs) in layout {
            let (sp, dev_addrs, drv_addrs) = self.bus(bus, &devs, &drvs, release);
            subsystems.push(sp + 0x18);
            for ((name, _), addr) in devs.iter().zip(dev_addrs) {
                devices.push((bus, *name, addr));
            }
            for ((name, _), addr) in drvs.iter().zip(drv_addrs) {
                drivers.push((bus, *name, addr));
            }
        }
        self.link(kset, &subsystems);

        // serial8250's driver_data
        let drvdata = self.alloc(0x10);
        self.mem.write_u32(drvdata, 4);
        self.mem.write_u64(drvdata + 0x08, 4);
        let serial = devices[0].2 + 0x10;
        self.mem.write_u64(serial + 0x18, drvdata);
        self.mem.write_u32(devices[0].2 + 0x08, u32::MAX);

        (devices, drivers, drvdata)
    }

    fn irq_desc(&mut self, address: u64, irq: u32, status: u32, name: &str) {
        self.mem.write_u32(address, irq);
        self.mem.write_u64(address + 0x08, irq as u64);
        self.mem.write_u32(address + 0x10, status);
        self.mem.write_u32(address + 0x14, 1);
        let name = self.string(name);
        self.mem.write_u64(address + 0x18, name);
    }

    fn irqs(&mut self, layout: IrqLayout) -> Vec<(u32, u64)> {
        let mut specs = vec![
            (1, 0x3, "i8042"),
            (4, 0x1, "ttyS0"),
            (9, 0x408, "acpi"),
            (20, 0x4, "ehci_hcd"),
        ];
        if layout == IrqLayout::Xarray {
            specs.push((70, 0x8, "nvme0q0"));
        }

        if layout.is_flat() {
            let nr_irqs = 32u64;
            let array = self.alloc(nr_irqs * 0x28);
            self.symbol("irq_desc", array);
            if layout == IrqLayout::Flat {
                let count = self.alloc(4);
                self.mem.write_u32(count, nr_irqs as u32);
                self.symbol("nr_irqs", count);
            }
            return specs
                .into_iter()
                .map(|(irq, status, name)| {
                    let desc = array + irq as u64 * 0x28;
                    self.irq_desc(desc, irq, status, name);
                    (irq, desc)
                })
                .collect();
        }

        let descs: Vec<(u32, u64)> = specs
            .into_iter()
            .map(|(irq, status, name)| {
                let desc = self.alloc(0x28);
                self.irq_desc(desc, irq, status, name);
                (irq, desc)
            })
            .collect();
        let desc = |irq: u32| {
            descs
                .iter()
                .find(|(n, _)| *n == irq)
                .map(|(_, d)| *d)
                .unwrap_or(0)
        };

        match layout {
            IrqLayout::Maple => {
                // Two leaves under one range node: [0, 4] and [5, ULONG_MAX]
                let leaf_a = self.alloc(0x100);
                for (i, (pivot, slot)) in [(0, 0), (1, desc(1)), (3, 0), (4, desc(4))]
                    .into_iter()
                    .enumerate()
                {
                    self.mem.write_u64(leaf_a + 0x08 + i as u64 * 8, pivot);
                    self.mem.write_u64(leaf_a + 0x80 + i as u64 * 8, slot);
                }
                let leaf_b = self.alloc(0x100);
                for (i, (pivot, slot)) in [(8, 0), (9, desc(9)), (19, 0), (20, desc(20))]
                    .into_iter()
                    .enumerate()
                {
                    self.mem.write_u64(leaf_b + 0x08 + i as u64 * 8, pivot);
                    self.mem.write_u64(leaf_b + 0x80 + i as u64 * 8, slot);
                }
                let root = self.alloc(0x100);
                self.mem.write_u64(root + 0x08, 4);
                self.mem.write_u64(root + 0x80, leaf_a | 0x08);
                self.mem.write_u64(root + 0x88, leaf_b | 0x08);

                let tree = self.alloc(0x10);
                self.mem.write_u64(tree + 0x08, root | 0x10 | 0x02);
                self.symbol("sparse_irqs", tree);
            }
            IrqLayout::Xarray => {
                let slot = |node: u64, index: u64| node + 0x18 + index * 8;
                let node_a = self.alloc(0x218);
                for irq in [1, 4, 9, 20] {
                    self.mem.write_u64(slot(node_a, irq), desc(irq as u32));
                }
                // index 21 is a sibling of 20
                self.mem.write_u64(slot(node_a, 21), (20 << 2) | 2);
                let node_b = self.alloc(0x218);
                self.mem.write_u64(slot(node_b, 6), desc(70));

                let root = self.alloc(0x218);
                self.mem.write_bytes(root, &[6]);
                self.mem.write_u64(slot(root, 0), node_a | 2);
                self.mem.write_u64(slot(root, 1), node_b | 2);

                let tree = self.alloc(0x10);
                self.mem.write_u64(tree + 0x08, root | 2);
                self.symbol("irq_desc_tree", tree);
            }
            _ => unreachable!(),
        }

        descs
    }
}
