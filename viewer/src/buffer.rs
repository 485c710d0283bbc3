/// The raw bytes of a demo. Owned by exactly one side at a time, it is moved into the
/// background parse and never copied.
#[derive(Debug)]
pub enum DemoBuffer {
    MemMapped(memmap2::Mmap),
    Preloaded(Vec<u8>),
}

impl DemoBuffer {
    pub fn open<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<std::path::Path>,
    {
        let file = std::fs::File::open(path.as_ref())?;
        // SAFETY: the mapping is read only and demo files are not modified while loaded
        let mmap = unsafe { memmap2::MmapOptions::new().map(&file)? };

        Ok(Self::MemMapped(mmap))
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Self::MemMapped(v) => v,
            Self::Preloaded(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

impl From<Vec<u8>> for DemoBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::Preloaded(value)
    }
}
