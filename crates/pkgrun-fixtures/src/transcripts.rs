//! Output recorded from the package tools the classifier understands.
//!
//! Trimmed to a handful of packages so the expected fractions stay easy to
//! compute by hand.

/// `apt-get install -y hello cowsay` on an English system.
pub const APT_INSTALL_EN: &[&str] = &[
    "Reading package lists...",
    "Building dependency tree...",
    "The following NEW packages will be installed:",
    "  cowsay hello",
    "0 upgraded, 2 newly installed, 0 to remove and 4 not upgraded.",
    "Need to get 73.4 kB of archives.",
    "Get:1 http://deb.debian.org/debian bookworm/main amd64 hello amd64 2.10-3 [56.7 kB]",
    "Get:2 http://deb.debian.org/debian bookworm/main amd64 cowsay all 3.03+dfsg2-8 [16.7 kB]",
    "Fetched 73.4 kB in 0s (412 kB/s)",
    "Selecting previously unselected package hello.",
    "Preparing to unpack .../hello_2.10-3_amd64.deb ...",
    "Unpacking hello (2.10-3) ...",
    "Unpacking cowsay (3.03+dfsg2-8) ...",
    "Setting up hello (2.10-3) ...",
    "Setting up cowsay (3.03+dfsg2-8) ...",
    "Processing triggers for man-db (2.11.2-2) ...",
];

/// `apt-get install -y vlc-data` on a Spanish system.
pub const APT_INSTALL_ES: &[&str] = &[
    "Leyendo lista de paquetes...",
    "Creando árbol de dependencias...",
    "0 actualizados, 1 nuevos se instalarán, 0 para eliminar y 3 no actualizados.",
    "Des:1 http://deb.debian.org/debian bookworm/main amd64 vlc-data all 3.0.20-0 [1.234 kB]",
    "Descargados 1.234 kB en 1s (1.020 kB/s)",
    "Desempaquetando vlc-data (3.0.20-0) ...",
    "Configurando vlc-data (3.0.20-0) ...",
];

/// `dpkg -i theme.deb`.
pub const DPKG_INSTALL: &[&str] = &[
    "Selecting previously unselected package distro-theme.",
    "(Reading database ... 215342 files and directories currently installed.)",
    "Preparing to unpack theme.deb ...",
    "Unpacking distro-theme (1.4) ...",
    "Setting up distro-theme (1.4) ...",
];

/// `wget https://example.org/wallpapers.zip` redirected to a file.
pub const WGET_DOWNLOAD: &[&str] = &[
    "--2024-05-01 10:00:00--  https://example.org/wallpapers.zip",
    "Resolving example.org (example.org)... 93.184.216.34",
    "Length: 2048000 (2,0M) [application/zip]",
    "Saving to: 'wallpapers.zip'",
    "     0K .......... .......... .......... 25% 1,2M 2s",
    "   512K .......... .......... .......... 50% 1,4M 1s",
    "  1024K .......... .......... .......... 75% 1,5M 1s",
    "  1536K .......... .......... .......... 100% 1,6M=1,3s",
    "'wallpapers.zip' saved [2048000/2048000]",
];

/// `unzip -o wallpapers.zip`.
pub const UNZIP_ARCHIVE: &[&str] = &[
    "Archive:  wallpapers.zip",
    "   creating: wallpapers/",
    " extracting: wallpapers/README",
    "  inflating: wallpapers/forest.png",
    "  inflating: wallpapers/sea.png",
];

/// `flatpak install -y flathub org.example.App` on a Spanish system.
///
/// The percentage restarts for the second ref, so the fraction drops back.
pub const FLATPAK_INSTALL_ES: &[&str] = &[
    "Buscando coincidencias…",
    "Instalando 1/2… org.example.App",
    "Descargando 1/2… 30%",
    "Descargando 1/2… 100%",
    "Descargando 2/2… 40%",
    "Descargando 2/2… 100%",
    "Instalación completa.",
];
