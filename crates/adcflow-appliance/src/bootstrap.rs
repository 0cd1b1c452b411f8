//! First-boot bootstrap document
//!
//! Appliances boot from an unconfigured image and configure themselves from
//! a cloud-init document on the config drive. The document drops two files,
//! `/root/config_data` (the JSON payload) and `/root/configure.py` (the
//! guest-side bootstrap), then runs the bootstrap once.

use crate::error::Result;
use crate::payload::UserData;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Guest-side bootstrap. Regenerates the appliance UUID, stops the traffic
/// manager, replays the config data into the appliance config files, renames
/// the placeholder config directory to the real hostname, reapplies system
/// config and restarts. If a cluster-join document is present it is replayed
/// last, once the local services are back up.
pub const GUEST_CONFIGURE_SCRIPT: &str = r#"#!/usr/bin/env python

import os
import json
from subprocess import Popen, PIPE, STDOUT, call

class ConfigFile(dict):
    def __init__(self, name, path):
        self.filename = "%s/%s" % (path, name)
        self._get_current_keys()

    def apply(self):
        with open(self.filename, "w") as config_file:
            for key, value in self.iteritems():
                config_file.write("%s\t%s\n" % (key, value))

    def _get_current_keys(self):
        with open(self.filename) as config_file:
            for line in config_file:
                try:
                    bits = line.split()
                    self[bits[0]] = " ".join(bits[1:])
                except:
                    pass


class ReplayData(dict):
    class ReplayDataParameter(object):
        def __init__(self, text):
            words = text.strip().split()
            self.key = words[0]
            self.prefix = words[0].split("!")[0]
            self.value_list = words[1:]
            self.value_str = " ".join(words[1:])

    def __init__(self, text):
        for line in text.split("\n"):
            words = line.split()
            try:
                self[words[0]] = self.ReplayDataParameter(line)
            except IndexError:
                pass


def main():
    ZEUSHOME = os.environ.get('ZEUSHOME', '/opt/zeus')
    new_user = None
    uuid_generate_proc = Popen(
        ["%s/zxtm/bin/zcli" % ZEUSHOME],
        stdout=PIPE, stdin=PIPE, stderr=STDOUT
    )
    uuid_generate_proc.communicate(input="System.Management.regenerateUUID")[0]
    call("%s/stop-zeus" % ZEUSHOME)
    with open("/root/config_data") as config_drive:
        user_data = json.loads(config_drive.read())
    global_config = ConfigFile('global.cfg', "%s/zxtm" % ZEUSHOME)
    settings_config = ConfigFile('settings.cfg', "%s/zxtm/conf" % ZEUSHOME)
    security_config = ConfigFile('security', "%s/zxtm/conf" % ZEUSHOME)
    replay_data = ReplayData(user_data['replay_data'])
    for parameter in replay_data.values():
        if parameter.key == "admin!password":
            password_proc = Popen(
                ['z-reset-password'],
                stdout=PIPE, stdin=PIPE, stderr=STDOUT
            )
            stdout = password_proc.communicate(input="%s\n%s" % (
                parameter.value_str, parameter.value_str
            ))[0]
        elif parameter.key == "monitor_user":
            new_user = {
                "username": parameter.value_list[0],
                "password": parameter.value_list[1],
                "group": "Guest"
            }
        elif parameter.key in [ 'rest!enabled', 'controlallow' ]:
            settings_config[parameter.key] = parameter.value_str
        elif parameter.key in [ 'developer_mode_accepted', 'nameip' ]:
            global_config[parameter.key] = parameter.value_str
        elif parameter.prefix in [ 'appliance', 'rest', 'control' ]:
            global_config[parameter.key] = parameter.value_str
        elif parameter.key in [ 'access' ]:
            security_config[parameter.key] = parameter.value_str
    global_config.apply()
    settings_config.apply()
    security_config.apply()
    os.remove("%s/zxtm/global.cfg" % ZEUSHOME)
    os.rename(
        "%s/zxtm/conf/zxtms/(none)" % ZEUSHOME,
        "%s/zxtm/conf/zxtms/%s" % (ZEUSHOME, user_data['hostname'])
    )
    os.symlink(
        "%s/zxtm/conf/zxtms/%s" % (ZEUSHOME, user_data['hostname']),
        "%s/zxtm/global.cfg" % ZEUSHOME
    )
    call([ "%s/zxtm/bin/sysconfig" % ZEUSHOME, "--apply" ])
    call("%s/start-zeus" % ZEUSHOME)
    if new_user is not None:
        user_proc = Popen(
            ["%s/zxtm/bin/zcli" % ZEUSHOME],
            stdout=PIPE, stdin=PIPE, stderr=STDOUT
        )
        user_proc.communicate(input="Users.addUser %s, %s, %s" % (
            new_user['username'], new_user['password'], new_user['group']
        ))[0]
    if user_data['cluster_join_data'] is not None:
        with open("/tmp/replay_data", "w") as replay_file:
            replay_file.write(user_data['cluster_join_data'])
        call([ "%s/zxtm/configure" % ZEUSHOME, "--replay-from=/tmp/replay_data" ])


if __name__ == "__main__":
    main()
"#;

/// Renders the cloud-init document for one appliance. Both payloads are
/// base64-encoded so cloud-init never has to cope with their contents.
pub fn cloud_init_document(user_data: &UserData) -> Result<String> {
    let config_data = STANDARD.encode(serde_json::to_vec(user_data)?);
    let configure_py = STANDARD.encode(GUEST_CONFIGURE_SCRIPT);
    Ok(format!(
        "#cloud-config\n\
         write_files:\n\
         -   encoding: b64\n\
         \x20   content: {config_data}\n\
         \x20   path: /root/config_data\n\
         \n\
         -   encoding: b64\n\
         \x20   content: {configure_py}\n\
         \x20   path: /root/configure.py\n\
         \n\
         runcmd:\n\
         -   [ \"python\", \"/root/configure.py\" ]\n"
    ))
}
